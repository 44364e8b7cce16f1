// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2026 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use std::sync::RwLock;
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Instant,
};

use log::*;

const UPDATE_SECS: f64 = 5.0;

#[derive(Clone, Copy)]
struct UpdateState {
    count: usize,
    time: f64,
    rate: f64,
}

/// Progress reporter that writes throttled updates to the log.
///
/// It can be ticked from many threads at once; at most one update is logged
/// every few seconds.
pub(crate) struct ProgressHandle {
    label: &'static str,
    total: usize,
    start: Instant,
    count: AtomicUsize,
    last_update: RwLock<Option<UpdateState>>,
}

impl ProgressHandle {
    pub fn new(label: &'static str, total: usize) -> Self {
        ProgressHandle {
            label,
            total,
            count: AtomicUsize::new(0),
            start: Instant::now(),
            last_update: RwLock::new(None),
        }
    }

    pub fn tick(&self) {
        self.advance(1);
    }

    pub fn advance(&self, n: usize) {
        let count = self.count.fetch_add(n, Ordering::Relaxed) + n;

        let last_update = match self.last_update.read() {
            Ok(lock) => *lock,
            // a panicking writer only loses us a progress message
            Err(_) => return,
        };

        let thresh = if let Some(lu) = last_update {
            // bail early if the rate estimate says we don't need to update
            let n = count.saturating_sub(lu.count) as f64;
            if n / lu.rate < UPDATE_SECS * 0.95 {
                return;
            }

            lu.time
        } else {
            0.0
        };

        let time = self.start.elapsed().as_secs_f64();
        // bail if we haven't been running long enough
        if time < thresh + UPDATE_SECS {
            return;
        }

        // we're ready to set the time! if someone else is writing, do nothing, they've handled it
        if let Ok(mut lock) = self.last_update.try_write() {
            let rate = count as f64 / time;
            *lock = Some(UpdateState { count, time, rate });
            self.refresh(count, rate);
        }
    }

    /// Get the number of completed units so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Log the final count and elapsed time.
    pub fn finish(&self) {
        debug!(
            "{}: finished {} of {} in {:.2}s",
            self.label,
            self.count(),
            self.total,
            self.start.elapsed().as_secs_f64()
        );
    }

    fn refresh(&self, count: usize, rate: f64) {
        info!(
            "{}: {} of {} ({:.1}/s)",
            self.label, count, self.total, rate
        );
    }
}
