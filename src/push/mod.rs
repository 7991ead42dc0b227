//! HTTP/2 server push.
//!
//! Push capability is a property of the connection a request arrived on, not
//! of the handler. The HTTP/2 connection driver installs a [`PushCapability`]
//! in each request's extensions; handlers ask for it through the
//! [`PushSupport`] extractor and get a tagged answer:
//!
//! - [`PushSupport::Supported`] with a pusher bound to the initiating stream
//! - [`PushSupport::Unsupported`] for HTTP/1.1, h2c without a driver, or tests
//!
//! # Routes
//!
//! - `GET /push` - push every catalog entry and return an HTML index of them

mod orchestrator;

pub use orchestrator::{push_catalog, render_document, trigger_push, PushReport};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::Extensions;
use std::convert::Infallible;
use std::sync::Arc;

/// Body of the response sent when the transport cannot push.
pub const UNSUPPORTED_BODY: &str = "HTTP/2 push not supported.";

/// Failure to push a single resource. Never fatal to the trigger request.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The identifier could not be turned into a push request.
    #[error("Invalid push target {target:?}: {reason}")]
    InvalidTarget { target: String, reason: String },

    /// The peer or the protocol state refused the push promise.
    #[error("Push of {target} refused: {source}")]
    Refused {
        target: String,
        #[source]
        source: h2::Error,
    },

    /// The initiating stream has already been answered or reset.
    #[error("Initiating stream is closed")]
    StreamClosed,

    /// Another trigger on the same connection is still pushing.
    #[error("Push of {target} skipped: another push is in progress on this connection")]
    ConnectionBusy { target: String },
}

/// Something able to push a resource on the current request's connection.
pub trait ResourcePusher: Send + Sync {
    /// Promise `target` to the client and arrange for it to be served.
    ///
    /// Returns once the promise is queued; serving the pushed resource
    /// happens in the background.
    fn push(&self, target: &str) -> Result<(), PushError>;
}

/// Request extension marking the connection as push capable.
#[derive(Clone)]
pub struct PushCapability(Arc<dyn ResourcePusher>);

impl PushCapability {
    pub fn new(pusher: Arc<dyn ResourcePusher>) -> Self {
        Self(pusher)
    }
}

/// Answer to "can this response push?".
#[derive(Clone)]
pub enum PushSupport {
    Supported(Arc<dyn ResourcePusher>),
    Unsupported,
}

impl PushSupport {
    pub fn from_extensions(extensions: &Extensions) -> Self {
        match extensions.get::<PushCapability>() {
            Some(PushCapability(pusher)) => Self::Supported(pusher.clone()),
            None => Self::Unsupported,
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported(_))
    }
}

impl std::fmt::Debug for PushSupport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Supported(_) => f.write_str("Supported"),
            Self::Unsupported => f.write_str("Unsupported"),
        }
    }
}

impl<S> FromRequestParts<S> for PushSupport
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_extensions(&parts.extensions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopPusher;

    impl ResourcePusher for NoopPusher {
        fn push(&self, _target: &str) -> Result<(), PushError> {
            Ok(())
        }
    }

    #[test]
    fn test_support_from_empty_extensions() {
        let support = PushSupport::from_extensions(&Extensions::new());
        assert!(!support.is_supported());
    }

    #[test]
    fn test_support_from_capability() {
        let mut extensions = Extensions::new();
        extensions.insert(PushCapability::new(Arc::new(NoopPusher)));

        let support = PushSupport::from_extensions(&extensions);
        assert!(support.is_supported());
        assert_eq!(format!("{support:?}"), "Supported");
    }

    #[test]
    fn test_push_error_display() {
        let err = PushError::InvalidTarget {
            target: "/public/a b.m4s".to_string(),
            reason: "invalid uri character".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid push target \"/public/a b.m4s\": invalid uri character"
        );
        assert_eq!(PushError::StreamClosed.to_string(), "Initiating stream is closed");
        assert_eq!(
            PushError::ConnectionBusy {
                target: "/public/a.m4s".to_string()
            }
            .to_string(),
            "Push of /public/a.m4s skipped: another push is in progress on this connection"
        );
    }
}
