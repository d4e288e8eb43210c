//! Lifecycle events sent to the recording listener

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle event types understood by the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    /// A stimulus started; begin recording
    Start,
    /// A stimulus ended; stop recording
    Stop,
    /// Flush recorded data for the experiment; recording resumes on the next START
    Save,
    /// Shut the listener's devices down
    Terminate,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Stop => "STOP",
            Self::Save => "SAVE",
            Self::Terminate => "TERMINATE",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "START" => Ok(Self::Start),
            "STOP" => Ok(Self::Stop),
            "SAVE" => Ok(Self::Save),
            "TERMINATE" => Ok(Self::Terminate),
            _ => Err(format!("Unknown event type: '{}' (expected start, stop, save or terminate)", s)),
        }
    }
}

/// A single notification, built right before it is sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stimulus_id: Option<String>,
}

impl LifecycleEvent {
    /// Build the event, keeping only the ids its type carries.
    ///
    /// TERMINATE carries no ids and SAVE carries only the experiment id, whatever
    /// the caller passes in.
    pub fn new(event_type: EventType, experiment_id: &str, stimulus_id: &str) -> Self {
        let (experiment_id, stimulus_id) = match event_type {
            EventType::Start | EventType::Stop => (Some(experiment_id.to_string()), Some(stimulus_id.to_string())),
            EventType::Save => (Some(experiment_id.to_string()), None),
            EventType::Terminate => (None, None),
        };

        Self {
            event_type,
            experiment_id,
            stimulus_id,
        }
    }

    /// Serialize to the compact JSON body POSTed to the listener
    pub fn to_body(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
