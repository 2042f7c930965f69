use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::config::{AutopilotConfig, TelemetryScale};
use crate::error::{ControlError, ControlResult, TransportError};
use crate::gnc::{Autopilot, CycleReport, FlightMode};
use crate::history::VisualizationSink;
use crate::link::{Actuation, AircraftState, Telemetry};
use super::console::ModeOverride;

// ---------------------------------------------------------------------------
// Fixed-rate control loop
// ---------------------------------------------------------------------------

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Commanded(CycleReport),
    /// Transport failed; setpoints held and nothing was actuated.
    Skipped(TransportError),
}

/// Totals reported when [`ControlLoop::run`] returns normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub skipped: u64,
    pub final_mode: FlightMode,
}

pub struct ControlLoop<L, S> {
    pub autopilot: Autopilot,
    link: L,
    sink: S,
    scale: TelemetryScale,
    period: Duration,
    max_consecutive_failures: u32,
    consecutive_failures: u32,
    ticks: u64,
    skipped: u64,
    tick_limit: Option<u64>,
}

impl<L, S> ControlLoop<L, S>
where
    L: Telemetry + Actuation,
    S: VisualizationSink,
{
    pub fn new(config: &AutopilotConfig, initial: FlightMode, link: L, sink: S) -> Self {
        let period = Duration::try_from_secs_f64(config.loop_cfg.dt).unwrap_or_else(|_| {
            warn!("loop.dt = {} is not a usable period, running unpaced", config.loop_cfg.dt);
            Duration::ZERO
        });
        Self {
            autopilot: Autopilot::new(config, initial),
            link,
            sink,
            scale: config.telemetry,
            period,
            max_consecutive_failures: config.loop_cfg.max_consecutive_failures,
            consecutive_failures: 0,
            ticks: 0,
            skipped: 0,
            tick_limit: None,
        }
    }

    /// Stop [`run`](Self::run) after `ticks` ticks.
    pub fn with_tick_limit(mut self, ticks: u64) -> Self {
        self.tick_limit = Some(ticks);
        self
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// One control cycle: read, compute, record, actuate.
    pub fn tick(&mut self) -> ControlResult<TickOutcome> {
        self.ticks += 1;

        let frame = match self.link.read() {
            Ok(frame) => frame,
            Err(e) => return self.transport_failure("telemetry read", e),
        };
        let state = AircraftState::from_frame(&frame, &self.scale);

        let report = self.autopilot.step(&state);
        self.sink.record(&report.sample);

        if let Err(e) = self.link.write(&report.command) {
            return self.transport_failure("actuation write", e);
        }

        if self.consecutive_failures > 0 {
            info!("link recovered after {} failed ticks", self.consecutive_failures);
        }
        self.consecutive_failures = 0;
        Ok(TickOutcome::Commanded(report))
    }

    fn transport_failure(&mut self, what: &str, e: TransportError) -> ControlResult<TickOutcome> {
        self.consecutive_failures += 1;
        self.skipped += 1;
        if self.consecutive_failures > self.max_consecutive_failures {
            error!(
                "{} failed {} times in a row ({}), shutting down",
                what, self.consecutive_failures, e
            );
            return Err(ControlError::TransportFatal {
                failures: self.consecutive_failures,
                last: e,
            });
        }
        warn!(
            "{} failed ({}), skipping tick [{}/{}]",
            what, e, self.consecutive_failures, self.max_consecutive_failures
        );
        Ok(TickOutcome::Skipped(e))
    }

    /// Apply pending overrides, latest selection wins. Returns `true` when
    /// an exit was requested.
    pub fn apply_overrides(&mut self, overrides: &Receiver<ModeOverride>) -> bool {
        let mut latest = None;
        loop {
            match overrides.try_recv() {
                Ok(ModeOverride::Exit) => return true,
                Ok(ModeOverride::Select(mode)) => latest = Some(mode),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if let Some(mode) = latest {
            if !self.autopilot.override_mode(mode) {
                info!("manual override: already in mode {}", mode);
            }
        }
        false
    }

    /// Tick at the configured period until shutdown, exit, or the tick
    /// limit. Fatal transport errors end the run with `Err`.
    pub fn run(
        &mut self,
        shutdown: &AtomicBool,
        overrides: &Receiver<ModeOverride>,
    ) -> ControlResult<RunSummary> {
        let start_ticks = self.ticks;
        let start_skipped = self.skipped;
        let mut next = Instant::now();

        info!(
            "control loop started at {:.0} Hz in mode {}",
            1.0 / self.period.as_secs_f64(),
            self.autopilot.mode()
        );

        while !shutdown.load(Ordering::Relaxed) {
            if let Some(limit) = self.tick_limit {
                if self.ticks - start_ticks >= limit {
                    break;
                }
            }
            if self.apply_overrides(overrides) {
                info!("exit requested");
                break;
            }

            self.tick()?;

            next += self.period;
            let now = Instant::now();
            if next > now {
                thread::sleep(next - now);
            } else {
                debug!("tick overran by {:?}", now - next);
                next = now;
            }
        }

        let summary = RunSummary {
            ticks: self.ticks - start_ticks,
            skipped: self.skipped - start_skipped,
            final_mode: self.autopilot.mode(),
        };
        info!(
            "control loop stopped after {} ticks ({} skipped)",
            summary.ticks, summary.skipped
        );
        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
