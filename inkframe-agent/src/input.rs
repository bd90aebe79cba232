//! Stdin stand-in for the device's button

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use inkframe_state::InputEvent;
use tracing::{debug, warn};

/// Map one input line to an event
pub fn parse_line(line: &str) -> Option<InputEvent> {
    match line.trim().to_ascii_lowercase().as_str() {
        "t" | "toggle" => Some(InputEvent::Toggle),
        "n" | "next" => Some(InputEvent::Advance),
        _ => None,
    }
}

/// Read events from stdin on a background thread
///
/// The thread only forwards events; the control loop drains the channel.
pub fn spawn_stdin_reader() -> std::io::Result<Receiver<InputEvent>> {
    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name("stdin-input".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(error = %e, "stdin read failed");
                        break;
                    }
                };

                match parse_line(&line) {
                    Some(event) => {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => debug!(input = %line.trim(), "ignoring unknown input"),
                }
            }
        })?;

    Ok(rx)
}
