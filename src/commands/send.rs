//! One-shot lifecycle commands (start, stop, save, terminate)

use colored::*;
use eyre::Result;

use crate::config::Config;
use crate::event::EventType;
use crate::notifier::EventNotifier;

/// Send a single event and report the outcome; exits 1 when the listener
/// cannot be reached or rejects the request.
pub fn run(event_type: EventType, experiment_id: Option<String>, stimulus_id: Option<String>, config: &Config) -> Result<()> {
    let experiment_id = experiment_id.unwrap_or_else(|| config.experiment_id.clone());
    let stimulus_id = stimulus_id.unwrap_or_else(|| config.stimulus_id.clone());

    let notifier = EventNotifier::new(config.endpoint.clone(), config.timeout());

    match notifier.notify(event_type, &experiment_id, &stimulus_id) {
        Ok(()) => {
            println!("{} {} sent to {}", "✓".green(), event_type.to_string().bold(), notifier.endpoint());
            Ok(())
        }
        Err(e) => {
            eprintln!(
                "{} {} could not be sent to {}: {}",
                "✗".red(),
                event_type.to_string().bold(),
                notifier.endpoint(),
                e
            );
            std::process::exit(1);
        }
    }
}
