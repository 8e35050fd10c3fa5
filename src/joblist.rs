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

//! The process-wide dispatcher: two queues of ready connections, a
//! condition variable, and the worker main loop.
//!
//! See `DESIGN.md` for the lock-order argument and the note on how this
//! crate realizes the spec's "append_lock also guards `jobq`" rule as a
//! per-connection lock instead, without changing any of the externally
//! observable ordering/coalescing/teardown behavior.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

use crate::connection::{Connection, ConnectionGuard, ConnectionState};
use crate::deferred::DeferredRun;
use crate::error::JobsError;
use crate::job::{Callback, EventFlags};
use crate::stream::ByteStream;

/// Process-wide job scheduler for one caster.
///
/// Two separate queues exist so that the hot producer path (the event-loop
/// thread appending jobs) and the consumer path (workers, usually waiting)
/// don't contend on the same lock: see spec.md §4.3.
pub struct JobList<S: ByteStream> {
    work_queue: Mutex<VecDeque<Arc<Connection<S>>>>,
    append_queue: Mutex<VecDeque<Arc<Connection<S>>>>,
    cond: Condvar,
    deferred: Arc<dyn DeferredRun>,
}

impl<S: ByteStream> JobList<S> {
    /// Creates an empty job list. Unlike the C original, this cannot fail:
    /// `VecDeque::new` performs no allocation until the first push. Use
    /// [`JobList::with_capacity`] if you want to reserve space up front and
    /// surface an allocation failure before committing to it.
    pub fn new(deferred: Arc<dyn DeferredRun>) -> Self {
        Self {
            work_queue: Mutex::new(VecDeque::new()),
            append_queue: Mutex::new(VecDeque::new()),
            cond: Condvar::new(),
            deferred,
        }
    }

    /// Like [`JobList::new`], but reserves capacity for `capacity`
    /// connections in both queues up front, returning
    /// [`JobsError::OutOfMemory`] if that reservation fails.
    pub fn with_capacity(deferred: Arc<dyn DeferredRun>, capacity: usize) -> Result<Self, JobsError> {
        let mut work_queue = VecDeque::new();
        work_queue.try_reserve(capacity).map_err(|_| JobsError::OutOfMemory)?;
        let mut append_queue = VecDeque::new();
        append_queue.try_reserve(capacity).map_err(|_| JobsError::OutOfMemory)?;
        Ok(Self {
            work_queue: Mutex::new(work_queue),
            append_queue: Mutex::new(append_queue),
            cond: Condvar::new(),
            deferred,
        })
    }

    /// Enqueues one callback for `connection`.
    ///
    /// The caller must already hold `guard`, `connection`'s own lock — the
    /// `ConnectionGuard` parameter is how this crate makes that precondition
    /// explicit at the call site rather than leaving it to a comment, the
    /// way the C original documents the event library holding the
    /// bufferevent lock during its own callback. `guard` and `connection`
    /// are still two independent parameters, so a debug assertion checks
    /// that `guard` actually came from locking `connection` and not some
    /// other connection.
    ///
    /// Silently drops the job (returning `Ok(())`) if the connection is
    /// `Ending`, or if it coalesces with the tail of the queue (spec.md
    /// §4.2). Returns [`JobsError::OutOfMemory`] if the job couldn't be
    /// allocated; the caller should log it and otherwise ignore it, since
    /// the event library will redeliver readiness.
    pub fn append(
        &self,
        connection: &Arc<Connection<S>>,
        guard: &mut ConnectionGuard<'_, S>,
        callback: Callback<S>,
        events: EventFlags,
    ) -> Result<(), JobsError> {
        debug_assert_eq!(
            guard.connection_id(),
            connection.id(),
            "guard must be locked from the same connection being appended to"
        );
        debug_assert!(
            !connection.is_bev_freed(),
            "append called after the connection's stream was freed"
        );

        if guard.state == ConnectionState::Ending {
            return Ok(());
        }

        guard.jobq.debug_assert_invariant();

        let needs_link = match guard.jobq.push(callback, events) {
            Ok(needs_link) => needs_link,
            Err(err) => {
                tracing::error!(connection = connection.id(), "out of memory appending a job");
                return Err(err);
            }
        };

        if needs_link {
            let mut append_queue = lock_or_recover(&self.append_queue);
            append_queue.push_back(Arc::clone(connection));
            guard.jobq.mark_linked();
            tracing::trace!(
                connection = connection.id(),
                njobs = guard.jobq.njobs(),
                "linked into append queue"
            );
        } else {
            tracing::trace!(
                connection = connection.id(),
                njobs = guard.jobq.njobs(),
                newjobs = guard.jobq.newjobs(),
                "appended (already linked or coalesced)"
            );
        }

        self.cond.notify_one();
        Ok(())
    }

    /// Worker entry point: loops forever, draining one connection's queue
    /// per iteration. Returns only if the process is exiting (there is no
    /// graceful per-worker shutdown; dropping the `JobList` while workers
    /// are parked on `cond` is undefined, matching spec.md §4.1's
    /// precondition on [`JobList::free`]).
    pub fn run(&self) -> ! {
        let mut work = lock_or_recover(&self.work_queue);
        loop {
            let connection = loop {
                if let Some(connection) = work.pop_front() {
                    break connection;
                }

                let mut append = lock_or_recover(&self.append_queue);
                if append.is_empty() {
                    drop(append);
                    work = wait_or_recover(&self.cond, work);
                    continue;
                }

                // O(1) splice: `work` is empty here (we just failed to pop
                // from it), so swapping the two deques is equivalent to the
                // original's STAILQ_SWAP.
                std::mem::swap(&mut *work, &mut *append);
                // Broadcast, not signal: a single splice can deposit more
                // than one ready connection, so every idle worker should
                // re-check the (now refilled) work queue.
                self.cond.notify_all();
                drop(append);
            };

            let mut guard = connection.lock();
            guard.jobq.mark_draining();
            drop(work);

            let mut ran = 0usize;
            while let Some(job) = guard.jobq.pop() {
                if guard.state != ConnectionState::Ending {
                    job.invoke(&guard.stream, &connection);
                }
                ran += 1;
            }
            tracing::debug!(connection = connection.id(), jobs = ran, "drained jobs for connection");

            drop(guard);
            self.deferred.run("joblist_run");

            work = lock_or_recover(&self.work_queue);
        }
    }

    /// Removes and drops every queued job for `connection`, without
    /// invoking any of them. `njobs` becomes `0`; `newjobs` keeps whatever
    /// linked/unlinked value it already had (spec.md §8 property 5).
    pub fn drain(guard: &mut ConnectionGuard<'_, S>) {
        let mut dropped = 0usize;
        while guard.jobq.pop().is_some() {
            dropped += 1;
        }
        debug_assert_eq!(guard.jobq.njobs(), 0);
        if dropped > 0 {
            tracing::debug!(jobs = dropped, "drained queued jobs without invoking them");
        }
    }

    /// Drains every connection still linked into either queue, then leaves
    /// the job list empty. Must only be called once no worker is running
    /// (spec.md §4.1).
    pub fn free(&self) {
        let mut work = lock_or_recover(&self.work_queue);
        for connection in work.drain(..) {
            Self::drain(&mut connection.lock());
        }
        drop(work);

        let mut append = lock_or_recover(&self.append_queue);
        for connection in append.drain(..) {
            Self::drain(&mut connection.lock());
        }
    }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("job list mutex poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

fn wait_or_recover<'a, T>(cond: &Condvar, guard: std::sync::MutexGuard<'a, T>) -> std::sync::MutexGuard<'a, T> {
    match cond.wait(guard) {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("condition variable wait observed a poisoned mutex, recovering");
            poisoned.into_inner()
        }
    }
}
