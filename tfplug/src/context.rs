//! Request-scoped context
//!
//! Every trait call receives a `Context`. It carries the log id that ties
//! together the log lines of one host request.

use std::sync::Arc;

/// Pass as the first parameter of every async trait method
#[derive(Clone, Debug)]
pub struct Context {
    log_id: Arc<str>,
}

impl Context {
    /// New context with a fresh random log id
    pub fn new() -> Self {
        Self::with_log_id(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_log_id(log_id: impl Into<String>) -> Self {
        Self {
            log_id: Arc::from(log_id.into()),
        }
    }

    pub fn log_id(&self) -> &str {
        &self.log_id
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_context_gets_its_own_log_id() {
        let a = Context::new();
        let b = Context::new();

        assert_ne!(a.log_id(), b.log_id());
        assert_eq!(a.clone().log_id(), a.log_id());
        assert_eq!(Context::with_log_id("req-1").log_id(), "req-1");
    }

    #[test]
    fn log_ids_are_uuids() {
        let ctx = Context::new();
        assert!(uuid::Uuid::parse_str(ctx.log_id()).is_ok());
    }
}
