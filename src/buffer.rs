//! Bounded sample storage for one measurement session.

use std::collections::VecDeque;

/// One camera frame reduced to per-channel intensity means.
///
/// Appended once, never mutated. Timestamps are milliseconds and must be
/// monotonic non-decreasing; the capture side is responsible for that.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub timestamp_ms: i64,
}

/// Rolling FIFO store of red/green intensities and their timestamps.
///
/// The three sequences stay index-aligned at all times: a push appends to
/// all of them, and once `capacity` is exceeded the oldest entry is evicted
/// from all of them. The blue channel is consumed by upstream heuristics
/// and is not buffered.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    red: VecDeque<f64>,
    green: VecDeque<f64>,
    timestamps: VecDeque<i64>,
    capacity: usize,
}

impl SampleBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            red: VecDeque::with_capacity(capacity),
            green: VecDeque::with_capacity(capacity),
            timestamps: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest entry once over capacity.
    pub fn push(&mut self, sample: Sample) {
        self.red.push_back(sample.red);
        self.green.push_back(sample.green);
        self.timestamps.push_back(sample.timestamp_ms);

        while self.red.len() > self.capacity {
            self.red.pop_front();
            self.green.pop_front();
            self.timestamps.pop_front();
        }
    }

    /// Drop all stored samples.
    pub fn clear(&mut self) {
        self.red.clear();
        self.green.clear();
        self.timestamps.clear();
    }

    pub fn len(&self) -> usize {
        self.red.len()
    }

    pub fn is_empty(&self) -> bool {
        self.red.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Red intensities, oldest first.
    pub fn red(&self) -> impl Iterator<Item = f64> + '_ {
        self.red.iter().copied()
    }

    /// Green intensities, oldest first.
    pub fn green(&self) -> impl Iterator<Item = f64> + '_ {
        self.green.iter().copied()
    }

    /// Sample timestamps (ms), oldest first.
    pub fn timestamps(&self) -> impl Iterator<Item = i64> + '_ {
        self.timestamps.iter().copied()
    }
}
