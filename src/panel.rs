//! Control panel: the button surface a front end binds to
//!
//! Every press maps to one lifecycle event and is sent on the runtime's
//! blocking pool, so the caller never waits on the network. Presses that
//! overlap are not ordered.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::event::EventType;
use crate::notifier::{EventNotifier, NotifyError, Transport};

/// Buttons exposed by the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Start,
    Stop,
    Save,
    Terminate,
}

impl Button {
    pub fn event_type(&self) -> EventType {
        match self {
            Button::Start => EventType::Start,
            Button::Stop => EventType::Stop,
            Button::Save => EventType::Save,
            Button::Terminate => EventType::Terminate,
        }
    }
}

impl From<EventType> for Button {
    fn from(event_type: EventType) -> Self {
        match event_type {
            EventType::Start => Button::Start,
            EventType::Stop => Button::Stop,
            EventType::Save => Button::Save,
            EventType::Terminate => Button::Terminate,
        }
    }
}

pub struct ControlPanel<T: Transport> {
    notifier: Arc<EventNotifier<T>>,
    handle: Handle,
    experiment_id: String,
    stimulus_id: String,
}

impl<T: Transport + 'static> ControlPanel<T> {
    pub fn new(
        notifier: Arc<EventNotifier<T>>,
        handle: Handle,
        experiment_id: impl Into<String>,
        stimulus_id: impl Into<String>,
    ) -> Self {
        Self {
            notifier,
            handle,
            experiment_id: experiment_id.into(),
            stimulus_id: stimulus_id.into(),
        }
    }

    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    pub fn stimulus_id(&self) -> &str {
        &self.stimulus_id
    }

    /// Ids used by later presses; sends already in flight keep their own copy
    pub fn set_experiment(&mut self, experiment_id: impl Into<String>) {
        self.experiment_id = experiment_id.into();
    }

    pub fn set_stimulus(&mut self, stimulus_id: impl Into<String>) {
        self.stimulus_id = stimulus_id.into();
    }

    /// Fire the event bound to `button` and return immediately.
    ///
    /// The handle resolves to the send's outcome; dropping it detaches the send.
    pub fn press(&self, button: Button) -> JoinHandle<Result<(), NotifyError>> {
        let event_type = button.event_type();
        log::info!("{} pressed", event_type);

        let notifier = Arc::clone(&self.notifier);
        let experiment_id = self.experiment_id.clone();
        let stimulus_id = self.stimulus_id.clone();

        self.handle
            .spawn_blocking(move || notifier.notify(event_type, &experiment_id, &stimulus_id))
    }
}
