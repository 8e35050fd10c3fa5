// Copyright 2022 Ryan Seipp
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

//! Per-connection FIFO of pending [`crate::job::Job`]s.

use std::collections::VecDeque;

use crate::error::JobsError;
use crate::job::{Callback, Job};
use crate::stream::ByteStream;

/// Per-connection job queue plus the bookkeeping the scheduler needs to
/// decide linking into the global append queue.
///
/// All of `jobq`/`njobs`/`newjobs` are meant to be read and mutated only
/// while holding the owning [`crate::connection::Connection`]'s lock (see
/// `connection.rs` and the dual-lock design note in `DESIGN.md`); nothing
/// here is independently synchronized.
#[derive(Debug)]
pub struct ConnectionJobQueue<S: ByteStream> {
    jobq: VecDeque<Job<S>>,
    njobs: usize,
    /// `0` unlinked and empty; `1` appended once but not yet linked (a
    /// transient value, always flipped to `-1` before `append` returns);
    /// `-1` linked into the append queue or the work queue.
    newjobs: i32,
}

impl<S: ByteStream> Default for ConnectionJobQueue<S> {
    fn default() -> Self {
        Self {
            jobq: VecDeque::new(),
            njobs: 0,
            newjobs: 0,
        }
    }
}

impl<S: ByteStream> ConnectionJobQueue<S> {
    /// Number of jobs currently queued.
    pub fn njobs(&self) -> usize {
        self.njobs
    }

    /// Raw `newjobs` bookkeeping value; see the type docs for its meaning.
    pub fn newjobs(&self) -> i32 {
        self.newjobs
    }

    /// Is this connection currently linked into the append queue or the
    /// work queue?
    pub fn is_linked(&self) -> bool {
        self.newjobs == -1
    }

    /// Whether the queue currently has no pending jobs.
    pub fn is_empty(&self) -> bool {
        self.jobq.is_empty()
    }

    /// Checks the linked-state invariant from spec.md §3/§8 property 7.
    /// Debug-only: a violation here is a bug in the scheduler itself, not
    /// in caller usage.
    pub(crate) fn debug_assert_invariant(&self) {
        if self.is_empty() {
            debug_assert!(
                self.njobs == 0 && self.newjobs == 0,
                "empty jobq must have njobs == 0 && newjobs == 0, got njobs={} newjobs={}",
                self.njobs,
                self.newjobs
            );
        } else {
            debug_assert!(
                self.njobs > 0 && self.newjobs == -1,
                "non-empty jobq must have njobs > 0 && newjobs == -1, got njobs={} newjobs={}",
                self.njobs,
                self.newjobs
            );
        }
    }

    /// Appends one job, coalescing it away if it matches the tail of the
    /// queue (spec.md §4.2). Returns `true` if the connection transitioned
    /// from unlinked to "needs linking" (`newjobs` reached `1`), in which
    /// case the caller must insert the connection into the append queue and
    /// flip `newjobs` to `-1`.
    ///
    /// `VecDeque::back()` is O(1) on every target Rust supports, so unlike
    /// the C original this never falls back to "coalescing disabled."
    pub(crate) fn push(&mut self, callback: Callback<S>, events: crate::job::EventFlags) -> Result<bool, JobsError> {
        if let Some(last) = self.jobq.back() {
            if last.matches(&callback, events) {
                return Ok(false);
            }
        }

        self.jobq
            .try_reserve(1)
            .map_err(|_| JobsError::OutOfMemory)?;
        self.jobq.push_back(Job::new(callback, events));
        self.njobs += 1;
        if self.newjobs >= 0 {
            self.newjobs += 1;
        }

        Ok(self.newjobs == 1)
    }

    /// Marks the connection linked (`newjobs = -1`) after the caller has
    /// inserted it into the append queue.
    pub(crate) fn mark_linked(&mut self) {
        self.newjobs = -1;
    }

    /// Marks the connection as having just been popped off the work queue
    /// and is about to be drained (spec.md §4.3 consumer step 4).
    pub(crate) fn mark_draining(&mut self) {
        self.newjobs = 0;
    }

    /// Pops the next job, if any, decrementing the counters the way the
    /// worker loop and `drain` both do.
    pub(crate) fn pop(&mut self) -> Option<Job<S>> {
        let job = self.jobq.pop_front()?;
        self.njobs -= 1;
        if self.newjobs > 0 {
            self.newjobs -= 1;
        }
        Some(job)
    }
}
