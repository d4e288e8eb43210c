//! HTTP transport used by the notifier

use std::time::Duration;

use super::NotifyError;

/// Something that can POST a body to a URL
pub trait Transport: Send + Sync {
    fn post(&self, url: &str, headers: &[(&str, &str)], body: &[u8]) -> Result<(), NotifyError>;
}

/// Blocking transport backed by a `ureq` agent.
///
/// 4xx and 5xx responses surface as errors; redirects are followed.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// `None` keeps ureq's default (no overall timeout)
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder().timeout_global(timeout).build().into();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Transport for UreqTransport {
    fn post(&self, url: &str, headers: &[(&str, &str)], body: &[u8]) -> Result<(), NotifyError> {
        let mut request = self.agent.post(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send(body)?;
        log::debug!("Listener at {} answered {}", url, response.status());
        Ok(())
    }
}
