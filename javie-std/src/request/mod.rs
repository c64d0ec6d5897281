//! One-shot request wrapper.
//!
//! A [`Request`] is a named, cached instance that is pointed at a target with
//! [`Request::to`] and run once with [`Request::execute`]. Its lifecycle is
//! announced on the shared [`Dispatcher`] under both a global and a
//! name-scoped event id:
//!
//! | event                      | arguments                     |
//! |----------------------------|-------------------------------|
//! | `Request.beforeSend`       | `[request]`                   |
//! | `Request.onError`          | `[errors, status, request]`   |
//! | `Request.onComplete`       | `[data, status, request]`     |
//!
//! The name-scoped variants append `": {name}"`, e.g. `Request.onComplete: login`.
//!
//! Once a request has executed, asking [`Requests::make`] for the same name
//! forks a child request that inherits the parent's configuration and its
//! name-scoped listeners.

mod form;
mod transport;

pub use form::FormData;
pub use transport::{DynTransport, Method, RequestSpec, Transport, TransportResponse};

use crate::dispatcher::{Dispatcher, Handle};
use javie_core::{
    BoxError, Config, DispatchError, Instance, InstanceCache, RequestError, Value,
    normalize_name,
};
use serde_json::json;
use std::sync::{
    Arc, Mutex, RwLock,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

/// Fired before the transport is called.
pub const BEFORE_SEND: &str = "Request.beforeSend";
/// Fired when the response carries an `errors` member.
pub const ON_ERROR: &str = "Request.onError";
/// Fired for every non-empty response.
pub const ON_COMPLETE: &str = "Request.onComplete";

/// The name-scoped variant of a lifecycle event.
pub fn scoped(event: &str, name: &str) -> String {
    format!("{event}: {name}")
}

/// A named one-shot request.
pub struct Request {
    name: String,
    executed: AtomicBool,
    config: RwLock<Config>,
    form: Mutex<Option<FormData>>,
    module: Arc<RwLock<Config>>,
    dispatcher: Arc<Dispatcher>,
}

impl Instance for Request {
    fn defaults() -> Config {
        Config::from_pairs([
            ("name", json!("")),
            ("type", json!("GET")),
            ("uri", json!("")),
            ("query", json!("")),
            ("data", json!("")),
            ("dataType", json!("json")),
            ("id", json!("")),
        ])
    }
}

impl Request {
    /// Point the request at `url`.
    ///
    /// `url` is either `"URI"` or `"METHOD URI"`; unknown methods fall back to
    /// `GET`. For non-`GET` methods a `?query` suffix moves into the `query`
    /// setting. `:baseUrl` inside the URI is replaced with this request's own
    /// `baseUrl` when one was put on it, otherwise with the module's current
    /// `baseUrl`.
    pub fn to(
        &self,
        url: &str,
        form: Option<FormData>,
        data_type: Option<&str>,
    ) -> Result<&Self, RequestError> {
        if url.is_empty() {
            return Err(RequestError::MissingParameter("url".into()));
        }

        let id = form
            .as_ref()
            .and_then(FormData::id)
            .map(|id| format!("#{id}"))
            .unwrap_or_default();

        let (method, raw_uri) = match url.split_once(' ') {
            None => (Method::Get, url),
            Some((method, rest)) => (
                Method::parse(method).unwrap_or_default(),
                rest.split(' ').next().unwrap_or_default(),
            ),
        };

        let mut query = String::new();
        let mut uri = raw_uri.to_string();
        if method != Method::Get {
            if let Some((path, tail)) = raw_uri.split_once('?') {
                uri = path.to_string();
                query = tail.to_string();
            }
        }

        let uri = uri.replace(":baseUrl", &self.base_url());

        self.put_many([
            ("name", json!(self.name)),
            ("type", json!(method.as_str())),
            ("uri", json!(uri)),
            ("query", json!(query)),
            ("data", json!("")),
            ("dataType", json!(data_type.unwrap_or("json"))),
            ("id", json!(id)),
        ]);
        *self.form.lock().unwrap_or_else(|p| p.into_inner()) = form;

        Ok(self)
    }

    /// Send the request through `transport`.
    ///
    /// Returns the parsed response body, or `None` for an empty body. Bodies
    /// that are not JSON are returned as a string value. A failing lifecycle
    /// listener aborts execution with its error.
    pub async fn execute<T: Transport>(&self, transport: &T) -> Result<Option<Value>, RequestError> {
        let serialized = self
            .form
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .map(FormData::serialize)
            .unwrap_or_default();
        let query = self.get_str("query");
        let data = [serialized, query]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("&");

        self.put("data", data.clone());
        self.executed.store(true, Ordering::Release);

        let before = vec![self.snapshot()];
        self.dispatcher.fire(BEFORE_SEND, &before)?;
        self.dispatcher.fire(&scoped(BEFORE_SEND, &self.name), &before)?;

        let spec = RequestSpec {
            method: Method::parse(&self.get_str("type")).unwrap_or_default(),
            uri: self.get_str("uri"),
            data,
            data_type: self.get_str("dataType"),
        };

        tracing::debug!(request = %self.name, method = %spec.method, uri = %spec.uri, "Executing request");

        let response = transport
            .send(&spec)
            .await
            .map_err(RequestError::Transport)?;

        if response.body.is_empty() {
            return Ok(None);
        }

        let status = json!(response.status);
        let mut data = serde_json::from_str::<Value>(&response.body)
            .unwrap_or_else(|_| Value::String(response.body.clone()));

        let errors = data
            .as_object_mut()
            .and_then(|object| object.get_mut("errors"))
            .map(Value::take);

        if let Some(errors) = errors {
            let args = vec![errors, status.clone(), self.snapshot()];
            self.dispatcher.fire(ON_ERROR, &args)?;
            self.dispatcher.fire(&scoped(ON_ERROR, &self.name), &args)?;
        }

        let args = vec![data.clone(), status, self.snapshot()];
        self.dispatcher.fire(ON_COMPLETE, &args)?;
        self.dispatcher.fire(&scoped(ON_COMPLETE, &self.name), &args)?;

        Ok(Some(data))
    }

    /// Register a listener for one of this request's name-scoped events.
    pub fn on<F>(&self, event: &str, callback: F) -> Result<Handle, DispatchError>
    where
        F: Fn(&Dispatcher, &Vec<Value>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.dispatcher.listen(&scoped(event, &self.name), callback)
    }

    /// Set one setting.
    pub fn put(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.config
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .set_one(key, value);
    }

    /// Set several settings.
    pub fn put_many<K, V, I>(&self, pairs: I)
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.config
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .set_many(pairs);
    }

    /// Read a setting.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.config
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(key)
            .cloned()
    }

    /// Read a setting with a fallback.
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.get(key).unwrap_or_else(|| default.into())
    }

    fn base_url(&self) -> String {
        self.get("baseUrl")
            .filter(Value::is_string)
            .or_else(|| {
                self.module
                    .read()
                    .unwrap_or_else(|p| p.into_inner())
                    .get("baseUrl")
                    .cloned()
            })
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    fn get_str(&self, key: &str) -> String {
        self.get(key)
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    /// Snapshot of all settings.
    pub fn config(&self) -> Config {
        self.config.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// The settings as a JSON object, as handed to lifecycle listeners.
    pub fn snapshot(&self) -> Value {
        self.config.read().unwrap_or_else(|p| p.into_inner()).to_value()
    }

    /// The form attached by [`to`](Self::to), if any.
    pub fn form(&self) -> Option<FormData> {
        self.form.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Whether [`execute`](Self::execute) has been called.
    pub fn executed(&self) -> bool {
        self.executed.load(Ordering::Acquire)
    }

    /// Instance name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The request module: shared dispatcher, module settings, named requests.
pub struct Requests {
    dispatcher: Arc<Dispatcher>,
    cache: InstanceCache<Request>,
    next_child: AtomicU64,
}

impl Requests {
    /// Create the module, announcing lifecycle events on `dispatcher`.
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            cache: InstanceCache::new(Config::from_pairs([("baseUrl", Value::Null)])),
            next_child: AtomicU64::new(1),
        }
    }

    /// Get the request named `name`, forking a child if it already executed.
    pub fn make(&self, name: Option<&str>) -> Arc<Request> {
        let name = normalize_name(name);

        match self.cache.get(Some(name)) {
            Some(parent) if parent.executed() => self.fork(&parent),
            Some(existing) => existing,
            None => self.build(name),
        }
    }

    fn build(&self, name: &str) -> Arc<Request> {
        self.cache.make(Some(name), |name, mut config| {
            // Read live from the module so later `Requests::put` calls apply.
            config.remove("baseUrl");
            config.set_one("name", name);
            Request {
                name: name.to_string(),
                executed: AtomicBool::new(false),
                config: RwLock::new(config),
                form: Mutex::new(None),
                module: self.cache.shared_config(),
                dispatcher: Arc::clone(&self.dispatcher),
            }
        })
    }

    fn fork(&self, parent: &Request) -> Arc<Request> {
        let child_name = loop {
            let n = self.next_child.fetch_add(1, Ordering::Relaxed);
            let candidate = format!("{}_{n}", parent.name);
            if !self.cache.contains(Some(&candidate)) {
                break candidate;
            }
        };

        let child = self.build(&child_name);
        for event in [ON_ERROR, ON_COMPLETE, BEFORE_SEND] {
            self.dispatcher
                .as_ref()
                .clone(&scoped(event, &parent.name))
                .to(&scoped(event, &child_name));
        }

        let mut inherited = parent.config();
        inherited.set_one("name", child_name.as_str());
        child.put_many(inherited.iter().map(|(k, v)| (k.clone(), v.clone())));
        *child.form.lock().unwrap_or_else(|p| p.into_inner()) = parent.form();

        tracing::debug!(parent = %parent.name, child = %child_name, "Forked executed request");
        child
    }

    /// Set one module setting. `baseUrl` is seen by every request, including
    /// ones built earlier that did not put their own.
    pub fn put(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.cache.set_one(key, value);
    }

    /// Set several module settings.
    pub fn put_many<K, V, I>(&self, pairs: I)
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.cache.set_many(pairs);
    }

    /// Read a module setting.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.cache.value(key)
    }

    /// Read a module setting with a fallback.
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.cache.value_or(key, default)
    }

    /// The dispatcher lifecycle events go to.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// The underlying instance cache.
    pub fn instances(&self) -> &InstanceCache<Request> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CallRecorder, MockTransport};

    fn module() -> Requests {
        Requests::new(Arc::new(Dispatcher::new()))
    }

    #[test]
    fn test_to_parses_method_and_moves_query() {
        let requests = module();
        let r = requests.make(Some("save"));
        r.to("POST http://foobar.com/users?draft=1", None, None).unwrap();

        assert_eq!(r.get_str("type"), "POST");
        assert_eq!(r.get_str("uri"), "http://foobar.com/users");
        assert_eq!(r.get_str("query"), "draft=1");
        assert_eq!(r.get_str("dataType"), "json");
    }

    #[test]
    fn test_get_keeps_query_in_uri() {
        let requests = module();
        let r = requests.make(None);
        r.to("GET http://google.com?q=foobar", None, Some("xml")).unwrap();

        assert_eq!(r.get_str("uri"), "http://google.com?q=foobar");
        assert_eq!(r.get_str("query"), "");
        assert_eq!(r.get_str("dataType"), "xml");
    }

    #[test]
    fn test_unknown_method_falls_back_to_get() {
        let requests = module();
        let r = requests.make(None);
        r.to("PATCH /users/1?x=1", None, None).unwrap();

        assert_eq!(r.get_str("type"), "GET");
        assert_eq!(r.get_str("uri"), "/users/1?x=1");
    }

    #[test]
    fn test_base_url_is_substituted() {
        let requests = module();
        requests.put("baseUrl", "http://api.local");
        let r = requests.make(Some("users"));
        r.to("PUT :baseUrl/users/1", Some(FormData::new().with_id("edit")), None)
            .unwrap();

        assert_eq!(r.get_str("uri"), "http://api.local/users/1");
        assert_eq!(r.get_str("id"), "#edit");
    }

    #[test]
    fn test_base_url_set_after_make_is_used() {
        let requests = module();
        let early = requests.make(Some("early"));
        requests.put("baseUrl", "http://foobar.com");

        early.to("POST :baseUrl/users", None, None).unwrap();
        assert_eq!(early.get_str("uri"), "http://foobar.com/users");

        requests.put("baseUrl", "http://moved.com");
        early.to("GET :baseUrl/users", None, None).unwrap();
        assert_eq!(early.get_str("uri"), "http://moved.com/users");
    }

    #[test]
    fn test_request_base_url_overrides_module() {
        let requests = module();
        requests.put("baseUrl", "http://module.com");
        let r = requests.make(None);
        r.put("baseUrl", "http://own.com");

        r.to(":baseUrl/ping", None, None).unwrap();
        assert_eq!(r.get_str("uri"), "http://own.com/ping");

        r.put("baseUrl", Value::Null);
        r.to(":baseUrl/ping", None, None).unwrap();
        assert_eq!(r.get_str("uri"), "http://module.com/ping");
    }

    #[tokio::test]
    async fn test_forked_child_sees_current_base_url() {
        let requests = module();
        let parent = requests.make(Some("feed"));
        parent.to(":baseUrl/feed", None, None).unwrap();
        parent.execute(&MockTransport::new(200, "{}")).await.unwrap();
        assert_eq!(parent.get_str("uri"), "/feed");

        requests.put("baseUrl", "http://foobar.com");
        let child = requests.make(Some("feed"));
        child.to(":baseUrl/feed", None, None).unwrap();
        assert_eq!(child.get_str("uri"), "http://foobar.com/feed");
    }

    #[test]
    fn test_empty_url_is_rejected() {
        let requests = module();
        let err = requests.make(None).to("", None, None).err().unwrap();
        assert!(matches!(err, RequestError::MissingParameter(_)));
    }

    #[tokio::test]
    async fn test_execute_fires_lifecycle_in_order() {
        let requests = module();
        let ev = Arc::clone(requests.dispatcher());
        let order = CallRecorder::new();

        for id in [
            BEFORE_SEND.to_string(),
            scoped(BEFORE_SEND, "login"),
            ON_ERROR.to_string(),
            scoped(ON_COMPLETE, "login"),
        ] {
            ev.listen(&id, order.tagged(&id)).unwrap();
        }

        let r = requests.make(Some("login"));
        r.to(
            "POST /login",
            Some(FormData::new().field("user", "amy")),
            None,
        )
        .unwrap();

        let transport = MockTransport::new(200, r#"{"ok":true}"#);
        let data = r.execute(&transport).await.unwrap();

        assert_eq!(data, Some(json!({"ok": true})));
        assert_eq!(
            order.tags(),
            vec![
                "Request.beforeSend".to_string(),
                "Request.beforeSend: login".to_string(),
                "Request.onComplete: login".to_string(),
            ]
        );
        assert_eq!(transport.requests()[0].data, "user=amy");
        assert_eq!(transport.requests()[0].method, Method::Post);
    }

    #[tokio::test]
    async fn test_errors_member_fires_on_error_and_is_cleared() {
        let requests = module();
        let errors = CallRecorder::new();
        requests
            .dispatcher()
            .listen(ON_ERROR, errors.listener())
            .unwrap();

        let r = requests.make(None);
        r.to("POST /save?x=1", None, None).unwrap();
        let transport = MockTransport::new(422, r#"{"errors":{"name":"required"}}"#);
        let data = r.execute(&transport).await.unwrap().unwrap();

        assert_eq!(data, json!({"errors": null}));
        let calls = errors.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0], json!({"name": "required"}));
        assert_eq!(calls[0][1], json!(422));
        assert_eq!(transport.requests()[0].data, "x=1");
    }

    #[tokio::test]
    async fn test_empty_body_skips_completion() {
        let requests = module();
        let complete = CallRecorder::new();
        requests
            .dispatcher()
            .listen(ON_COMPLETE, complete.listener())
            .unwrap();

        let r = requests.make(None);
        r.to("/ping", None, None).unwrap();
        let data = r.execute(&MockTransport::new(204, "")).await.unwrap();

        assert_eq!(data, None);
        assert_eq!(complete.count(), 0);
        assert!(r.executed());
    }

    #[tokio::test]
    async fn test_non_json_body_is_returned_as_string() {
        let requests = module();
        let r = requests.make(None);
        r.to("/hello", None, Some("text")).unwrap();
        let data = r.execute(&MockTransport::new(200, "hi")).await.unwrap();
        assert_eq!(data, Some(json!("hi")));
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported() {
        let requests = module();
        let r = requests.make(None);
        r.to("/down", None, None).unwrap();

        let err = r.execute(&MockTransport::failing("refused")).await.unwrap_err();
        assert!(matches!(err, RequestError::Transport(_)));
    }

    #[tokio::test]
    async fn test_executed_request_forks_a_child() {
        let requests = module();
        let parent = requests.make(Some("search"));
        let complete = CallRecorder::new();
        parent.on(ON_COMPLETE, complete.listener()).unwrap();
        parent.put("custom", "kept");
        parent.to("GET /search", None, None).unwrap();

        assert!(Arc::ptr_eq(&parent, &requests.make(Some("search"))));
        parent.execute(&MockTransport::new(200, "{}")).await.unwrap();

        let child = requests.make(Some("search"));
        assert!(!Arc::ptr_eq(&parent, &child));
        assert!(child.name().starts_with("search_"));
        assert!(!child.executed());
        assert_eq!(child.get_str("custom"), "kept");
        assert_eq!(child.get_str("name"), child.name());
        assert_eq!(child.get_str("uri"), "/search");

        child.execute(&MockTransport::new(200, "{}")).await.unwrap();
        assert_eq!(complete.count(), 2);
    }
}
