use std::io::BufRead;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use log::{info, warn};

use crate::error::OverrideParseError;
use crate::gnc::FlightMode;

/// Operator request delivered to the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeOverride {
    Select(FlightMode),
    Exit,
}

/// `"exit"` or a mode number 1..=8 (`"6"` and `"6.0"` both work).
pub fn parse_override(line: &str) -> Result<ModeOverride, OverrideParseError> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("exit") {
        return Ok(ModeOverride::Exit);
    }
    FlightMode::parse_selector(line).map(ModeOverride::Select)
}

/// Forward parsed lines from `input` until EOF, `exit`, or the receiver
/// hangs up. Bad lines are logged and skipped. Returns the number of
/// overrides sent.
pub fn forward_overrides<R: BufRead>(input: R, tx: &Sender<ModeOverride>) -> usize {
    let mut sent = 0;
    for line in input.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!("console read failed: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_override(&line) {
            Ok(cmd) => {
                if tx.send(cmd).is_err() {
                    break;
                }
                sent += 1;
                if cmd == ModeOverride::Exit {
                    break;
                }
            }
            Err(e) => warn!("ignoring console input: {}", e),
        }
    }
    sent
}

/// Read overrides from stdin on a background thread.
pub fn spawn_console_input(tx: Sender<ModeOverride>) -> JoinHandle<()> {
    thread::spawn(move || {
        info!("console: enter a mode number 1-8 or 'exit'");
        let stdin = std::io::stdin();
        forward_overrides(stdin.lock(), &tx);
    })
}
