//! Bounded per-cycle history for plotting and export.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// One cycle of tracked quantities and their setpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotSample {
    pub roll: f64,
    pub roll_sp: f64,
    pub pitch: f64,
    pub pitch_sp: f64,
    pub heading: f64,
    pub heading_sp: f64,
    pub altitude: f64,
    pub altitude_sp: f64,
    pub airspeed: f64,
    pub airspeed_sp: f64,
}

/// Receives one sample per control cycle.
pub trait VisualizationSink {
    fn record(&mut self, sample: &PlotSample);
}

/// Discards everything. For loops that run without a plotter.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl VisualizationSink for NullSink {
    fn record(&mut self, _sample: &PlotSample) {}
}

/// Ring of the most recent samples, tagged with a running index.
#[derive(Debug, Clone)]
pub struct FlightHistory {
    capacity: usize,
    next_index: u64,
    samples: VecDeque<(u64, PlotSample)>,
}

impl FlightHistory {
    pub const DEFAULT_CAPACITY: usize = 300;

    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, next_index: 1, samples: VecDeque::with_capacity(capacity) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn push(&mut self, sample: PlotSample) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back((self.next_index, sample));
        self.next_index += 1;
    }

    /// `(index, sample)` pairs, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &(u64, PlotSample)> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&PlotSample> {
        self.samples.back().map(|(_, s)| s)
    }

    /// `[index, value]` points for one channel, ready for a line plot.
    pub fn series(&self, pick: impl Fn(&PlotSample) -> f64) -> Vec<[f64; 2]> {
        self.samples.iter().map(|(i, s)| [*i as f64, pick(s)]).collect()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for FlightHistory {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl VisualizationSink for FlightHistory {
    fn record(&mut self, sample: &PlotSample) {
        self.push(*sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(altitude: f64) -> PlotSample {
        PlotSample { altitude, ..Default::default() }
    }

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let mut h = FlightHistory::new(3);
        for i in 0..5 {
            h.push(sample(i as f64));
        }
        assert_eq!(h.len(), 3);
        let alts: Vec<f64> = h.iter().map(|(_, s)| s.altitude).collect();
        assert_eq!(alts, vec![2.0, 3.0, 4.0]);
        let idx: Vec<u64> = h.iter().map(|(i, _)| *i).collect();
        assert_eq!(idx, vec![3, 4, 5]);
    }

    #[test]
    fn default_capacity_is_300() {
        let mut h = FlightHistory::default();
        for i in 0..1000 {
            h.record(&sample(i as f64));
        }
        assert_eq!(h.len(), 300);
        assert_eq!(h.latest().unwrap().altitude, 999.0);
    }

    #[test]
    fn series_extracts_channel() {
        let mut h = FlightHistory::new(10);
        h.push(sample(100.0));
        h.push(sample(110.0));
        assert_eq!(h.series(|s| s.altitude), vec![[1.0, 100.0], [2.0, 110.0]]);
    }
}
