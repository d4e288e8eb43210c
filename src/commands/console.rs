//! Interactive control panel
//!
//! Reads one command per line from stdin and presses the matching panel
//! button. Sends run in the background; the prompt never waits on the network.

use chrono::Local;
use colored::*;
use eyre::{Context, Result};
use std::io::{self, BufRead};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

use crate::cli::Ids;
use crate::config::Config;
use crate::event::EventType;
use crate::notifier::{EventNotifier, NotifyError, Transport};
use crate::panel::{Button, ControlPanel};

#[derive(Debug, Clone, PartialEq, Eq)]
enum ConsoleCommand {
    Press(Button),
    SetStimulus(String),
    SetExperiment(String),
    Status,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

fn parse_command(line: &str) -> ConsoleCommand {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return ConsoleCommand::Empty;
    };
    let arg = words.next().map(str::to_string);

    if let Ok(event_type) = head.parse::<EventType>() {
        return ConsoleCommand::Press(Button::from(event_type));
    }

    match (head.to_lowercase().as_str(), arg) {
        ("s", _) => ConsoleCommand::Press(Button::Start),
        ("p", _) => ConsoleCommand::Press(Button::Stop),
        ("v", _) => ConsoleCommand::Press(Button::Save),
        ("t", _) => ConsoleCommand::Press(Button::Terminate),
        ("stimulus" | "stim", Some(id)) => ConsoleCommand::SetStimulus(id),
        ("experiment" | "exp", Some(id)) => ConsoleCommand::SetExperiment(id),
        ("status", _) => ConsoleCommand::Status,
        ("help" | "h" | "?", _) => ConsoleCommand::Help,
        ("quit" | "q" | "exit", _) => ConsoleCommand::Quit,
        _ => ConsoleCommand::Unknown(line.trim().to_string()),
    }
}

pub fn run(ids: Ids, config: &Config) -> Result<()> {
    let rt = Runtime::new().context("Failed to create tokio runtime")?;

    let notifier = Arc::new(EventNotifier::new(config.endpoint.clone(), config.timeout()));
    let mut panel = ControlPanel::new(
        notifier,
        rt.handle().clone(),
        ids.experiment_id.unwrap_or_else(|| config.experiment_id.clone()),
        ids.stimulus_id.unwrap_or_else(|| config.stimulus_id.clone()),
    );

    println!("{} Control panel for {}", "▶".blue(), config.endpoint.cyan());
    print_status(&panel);
    print_help();

    let mut in_flight: Vec<JoinHandle<()>> = Vec::new();

    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read from stdin")?;

        match parse_command(&line) {
            ConsoleCommand::Press(button) => {
                let event_type = button.event_type();
                in_flight.push(report(&rt, event_type, panel.press(button)));
                if button == Button::Terminate {
                    break;
                }
            }
            ConsoleCommand::SetStimulus(id) => {
                panel.set_stimulus(id);
                print_status(&panel);
            }
            ConsoleCommand::SetExperiment(id) => {
                panel.set_experiment(id);
                print_status(&panel);
            }
            ConsoleCommand::Status => print_status(&panel),
            ConsoleCommand::Help => print_help(),
            ConsoleCommand::Quit => break,
            ConsoleCommand::Empty => {}
            ConsoleCommand::Unknown(input) => {
                println!("{} Unknown command: {} (type 'help')", "?".yellow(), input);
            }
        }

        in_flight.retain(|handle| !handle.is_finished());
    }

    if !in_flight.is_empty() {
        log::debug!("Waiting for {} in-flight sends", in_flight.len());
    }
    for handle in in_flight {
        if let Err(e) = rt.block_on(handle) {
            log::error!("Report task failed: {}", e);
        }
    }

    Ok(())
}

/// Print the outcome of a press once its send completes
fn report(rt: &Runtime, event_type: EventType, send: JoinHandle<Result<(), NotifyError>>) -> JoinHandle<()> {
    rt.spawn(async move {
        let outcome = send.await;
        let time = Local::now().format("%H:%M:%S").to_string();
        match outcome {
            Ok(Ok(())) => println!("{} {} {} delivered", time.dimmed(), "✓".green(), event_type),
            Ok(Err(e)) => println!("{} {} {} failed: {}", time.dimmed(), "✗".red(), event_type, e),
            Err(e) => log::error!("Send task for {} did not complete: {}", event_type, e),
        }
    })
}

fn print_status<T: Transport + 'static>(panel: &ControlPanel<T>) {
    println!(
        "  experiment: {}  stimulus: {}",
        panel.experiment_id().green(),
        panel.stimulus_id().green()
    );
}

fn print_help() {
    println!();
    println!("  {}  start      {}  stop      {}  save      {}  terminate (and exit)", "s".bold(), "p".bold(), "v".bold(), "t".bold());
    println!("  {} ID  set stimulus id      {} ID  set experiment id", "stimulus".bold(), "experiment".bold());
    println!("  {}  show ids      {}  help      {}  quit", "status".bold(), "h".bold(), "q".bold());
    println!();
}
