//! In-memory transports for tests

use std::sync::Mutex;

use super::{NotifyError, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Records every request and reports success
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<RecordedRequest>>,
}

impl RecordingTransport {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    fn post(&self, url: &str, headers: &[(&str, &str)], body: &[u8]) -> Result<(), NotifyError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            headers: headers.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            body: String::from_utf8_lossy(body).to_string(),
        });
        Ok(())
    }
}

/// Fails every request with a fixed message
pub struct FailingTransport {
    message: String,
}

impl FailingTransport {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl Transport for FailingTransport {
    fn post(&self, _url: &str, _headers: &[(&str, &str)], _body: &[u8]) -> Result<(), NotifyError> {
        Err(NotifyError::Transport(self.message.clone()))
    }
}
