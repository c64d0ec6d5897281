//! Form payloads for [`Request::to`](super::Request::to).
//!
//! ```rust
//! use javie_std::request::FormData;
//!
//! let form = FormData::new().with_id("login").field("user", "amy");
//! assert_eq!(form.id(), Some("login"));
//! assert_eq!(form.serialize(), "user=amy");
//! ```

use url::form_urlencoded;

/// Form fields to submit with a request.
///
/// Stands in for the element a browser would serialize: an optional element id
/// plus ordered name/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    id: Option<String>,
    fields: Vec<(String, String)>,
}

impl FormData {
    /// Create an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the element id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Append a field. Repeated names are kept in order.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// The element id, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The fields, in insertion order.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Encode as `application/x-www-form-urlencoded`.
    pub fn serialize(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.fields.iter())
            .finish()
    }
}
