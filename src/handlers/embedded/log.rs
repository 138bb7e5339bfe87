//! # LogHandler: unclaimed-event logger
//!
//! A minimal handler that logs every event it sees through `tracing` and lets
//! the chain continue. Registered without codes, it becomes a default handler
//! and therefore reports exactly the events nobody else claimed.
//!
//! ## Example output
//! ```text
//! INFO eventvisor: event code=7 source=job-1:3 sources=4 claimed=false
//! ```

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::handlers::{Flow, Handler, HandlerSpec, Notification};

/// Event logging handler.
#[derive(Debug, Default)]
pub struct LogHandler;

impl LogHandler {
    /// Construct a new [`LogHandler`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Default-category registration of a [`LogHandler`] under `name`.
    #[must_use]
    pub fn spec(name: &str) -> HandlerSpec {
        HandlerSpec::new(name, std::sync::Arc::new(Self)).with_locator("eventvisor::LogHandler")
    }
}

#[async_trait]
impl Handler for LogHandler {
    async fn on_event(&self, n: &mut Notification) -> Result<Flow, HandlerError> {
        tracing::info!(
            code = %n.code(),
            source = %n.source(),
            range = %n.range(),
            sources = n.payload().source_count(),
            claimed = n.is_claimed(),
            "event"
        );
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, EventService, ProcId, Report, StatusCode};

    #[tokio::test(start_paused = true)]
    async fn test_logs_unclaimed_events_only() {
        let svc = EventService::builder(Config::default())
            .with_handler(LogHandler::spec("log"))
            .build()
            .unwrap();

        let d = svc
            .report_with_receipt(Report::new(StatusCode(3), ProcId::new("job", 0)))
            .await
            .unwrap()
            .await
            .unwrap();
        assert_eq!(d.visited.len(), 1);
        assert_eq!(&*d.visited[0], "log");
        assert!(d.failed.is_empty());
    }
}
