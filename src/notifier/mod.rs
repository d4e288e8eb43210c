//! Lifecycle notifier
//!
//! Turns a lifecycle event into one JSON POST to the recording listener.
//! Each call is independent: no retry, no dedup, no shared state.

pub mod error;
pub mod transport;

#[cfg(test)]
pub mod testing;

use std::time::Duration;

pub use error::NotifyError;
pub use transport::{Transport, UreqTransport};

use crate::event::{EventType, LifecycleEvent};

/// Listener address used when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:9331";

/// Headers sent with every notification
pub const HEADERS: [(&str, &str); 2] = [("Accept", "application/json"), ("Content-Type", "application/json")];

/// Posts lifecycle events to a single listener endpoint
pub struct EventNotifier<T: Transport = UreqTransport> {
    endpoint: String,
    transport: T,
}

impl EventNotifier<UreqTransport> {
    /// Notifier over HTTP, with an optional overall request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self::with_transport(endpoint, UreqTransport::new(timeout))
    }
}

impl<T: Transport> EventNotifier<T> {
    pub fn with_transport(endpoint: impl Into<String>, transport: T) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send one lifecycle event.
    ///
    /// Failures are logged here and returned; nothing panics past this call.
    pub fn notify(&self, event_type: EventType, experiment_id: &str, stimulus_id: &str) -> Result<(), NotifyError> {
        let event = LifecycleEvent::new(event_type, experiment_id, stimulus_id);
        let body = event
            .to_body()
            .map_err(|e| NotifyError::Transport(format!("failed to encode {} body: {}", event_type, e)))?;

        log::debug!("POST {} {}", self.endpoint, body);

        match self.transport.post(&self.endpoint, &HEADERS, body.as_bytes()) {
            Ok(()) => {
                log::info!("{} sent to {}", event_type, self.endpoint);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to send {} to {}: {}", event_type, self.endpoint, e);
                Err(e)
            }
        }
    }
}
