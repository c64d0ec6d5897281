//! Module-wide output gate.
//!
//! The logger and profiler modules start silent. Each module owns one
//! [`Switch`] and every instance it builds holds a clone, so turning output on
//! at the module reaches loggers and profilers that already exist.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Output gate shared by a module and the instances it has built.
#[derive(Debug, Clone, Default)]
pub struct Switch {
    on: Arc<AtomicBool>,
}

impl Switch {
    /// Whether instances may write to their sink.
    pub fn is_enabled(&self) -> bool {
        self.on.load(Ordering::Acquire)
    }

    /// Open the gate. Returns `true` if it was closed before.
    pub fn enable(&self) -> bool {
        !self.on.swap(true, Ordering::AcqRel)
    }

    /// Close the gate. Returns `true` if it was open before.
    pub fn disable(&self) -> bool {
        self.on.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instances_follow_the_module() {
        let module = Switch::default();
        let logger = module.clone();
        assert!(!logger.is_enabled());

        assert!(module.enable());
        assert!(logger.is_enabled());
        assert!(!module.enable(), "Second enable changes nothing");

        assert!(logger.disable());
        assert!(!module.is_enabled());
    }
}
