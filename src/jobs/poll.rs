// Copyright (c) 2025 ADBC Drivers Contributors
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

//! Polling policy, time source and cooperative abort for job waits.

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Longest uninterrupted sleep; an abort is noticed within this interval.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// How a job wait polls.
///
/// Delays grow from `initial_delay` by `backoff_factor` up to `max_delay`.
/// The default policy has neither a deadline nor an attempt limit, so a job
/// that never finishes is waited on forever; set one of them when the
/// caller cannot afford that.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
    /// Give up after this many status polls.
    pub max_attempts: Option<u32>,
    /// Give up once this much time has passed since the wait started.
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            backoff_factor: 2.0,
            max_attempts: None,
            deadline: None,
        }
    }
}

impl PollPolicy {
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Fixed delay between polls.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            initial_delay: delay,
            max_delay: delay,
            backoff_factor: 1.0,
            ..Self::default()
        }
    }

    /// Delay to use after `delay`.
    pub(crate) fn next_delay(&self, delay: Duration) -> Duration {
        let factor = if self.backoff_factor.is_finite() && self.backoff_factor >= 1.0 {
            self.backoff_factor
        } else {
            1.0
        };
        Duration::try_from_secs_f64(delay.as_secs_f64() * factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Source of time for job waits.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration);
}

/// The wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// A clock that only moves when slept on. For tests.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    /// Total time slept so far.
    pub fn elapsed(&self) -> Duration {
        *self
            .elapsed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn advance(&self, duration: Duration) {
        let mut elapsed = self
            .elapsed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *elapsed += duration;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Shared flag that stops a job wait.
///
/// Aborting only stops local polling; the remote job keeps running unless it
/// is cancelled separately.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sleeps for `duration`, returning early once `abort` fires.
///
/// Returns false if the sleep was cut short.
pub(crate) fn sleep_unless_aborted(
    clock: &dyn Clock,
    duration: Duration,
    abort: Option<&AbortSignal>,
) -> bool {
    let Some(abort) = abort else {
        clock.sleep(duration);
        return true;
    };
    let mut remaining = duration;
    while !remaining.is_zero() {
        if abort.is_aborted() {
            return false;
        }
        let slice = remaining.min(SLEEP_SLICE);
        clock.sleep(slice);
        remaining -= slice;
    }
    !abort.is_aborted()
}
