// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Reading model and the bounded display window that feeds the chart.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One synthetic speed sample.
///
/// Wire form is the JSON object `{"speed": N, "timestamp": "HH:MM:SS"}`,
/// sent verbatim to both sinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Speed in km/h.
    pub speed: u32,

    /// Local time-of-day the sample was drawn, e.g. "14:03:07".
    pub timestamp: String,
}

impl Reading {
    pub fn new(speed: u32, timestamp: String) -> Self {
        Self { speed, timestamp }
    }
}

/// Sliding window of the most recent readings, oldest evicted first.
///
/// Mutated only by the generator task; the UI thread takes a snapshot
/// each frame. Capacity is fixed at construction.
#[derive(Debug)]
pub struct ReadingWindow {
    readings: VecDeque<Reading>,
    capacity: usize,
}

impl ReadingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            readings: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a reading, evicting the oldest entry once the window is full.
    pub fn push(&mut self, reading: Reading) {
        while self.readings.len() >= self.capacity {
            self.readings.pop_front();
        }
        self.readings.push_back(reading);
    }

    #[allow(dead_code)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    #[allow(dead_code)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    #[allow(dead_code)]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent reading, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&Reading> {
        self.readings.back()
    }

    /// Chart points as (index, speed) pairs in insertion order.
    #[must_use]
    pub fn plot_points(&self) -> Vec<[f64; 2]> {
        self.readings
            .iter()
            .enumerate()
            .map(|(i, r)| [i as f64, f64::from(r.speed)])
            .collect()
    }

    /// Time-of-day labels for the x axis, in insertion order.
    #[must_use]
    pub fn time_labels(&self) -> Vec<String> {
        self.readings.iter().map(|r| r.timestamp.clone()).collect()
    }
}

/// Thread-safe wrapper shared between the generator task and the UI.
pub type SharedReadingWindow = Arc<Mutex<ReadingWindow>>;
