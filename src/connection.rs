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

//! A connection: a [`ByteStream`] plus the job queue that serializes
//! callbacks for it.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::queue::ConnectionJobQueue;
use crate::stream::ByteStream;

/// Mirrors `NTRIP_END` from the original source: once a connection is
/// `Ending`, future appends are dropped and already-queued jobs are skipped
/// rather than invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Normal operation: appended jobs are queued and invoked.
    Active,
    /// Tearing down: appends are dropped, queued jobs are skipped.
    Ending,
}

/// The fields that sit behind a connection's single lock. This lock plays
/// the role of libevent's per-`bufferevent` lock in the original source,
/// and (per the dual-lock design note in `DESIGN.md`) also guards the job
/// queue bookkeeping that the spec describes as living under the
/// scheduler's separate `append_lock`.
#[derive(Debug)]
pub struct ConnectionInner<S: ByteStream> {
    /// The underlying transport. Public so callbacks invoked with a
    /// `&Arc<Connection<S>>` can lock it again themselves if they need it
    /// outside of the dispatch loop.
    pub stream: S,
    pub(crate) jobq: ConnectionJobQueue<S>,
    pub(crate) state: ConnectionState,
}

impl<S: ByteStream> ConnectionInner<S> {
    /// Number of callbacks currently queued for this connection.
    pub fn pending_jobs(&self) -> usize {
        self.jobq.njobs()
    }

    /// Whether this connection has been marked [`ConnectionState::Ending`].
    pub fn is_ending(&self) -> bool {
        self.state == ConnectionState::Ending
    }
}

/// One client or upstream-source session: a [`ByteStream`] and its pending
/// callback queue, reachable and lockable from both the event-loop thread
/// (producer) and any worker (consumer).
#[derive(Debug)]
pub struct Connection<S: ByteStream> {
    id: u64,
    inner: Mutex<ConnectionInner<S>>,
    /// Set once the event library has released the underlying stream.
    /// Appending after this point is a programmer error (spec.md §7); it is
    /// tracked independently of the lock so it can be asserted even from
    /// code that isn't currently holding the connection locked.
    bev_freed: AtomicBool,
}

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

impl<S: ByteStream> Connection<S> {
    /// Wraps a stream in a new, active connection with an empty job queue.
    pub fn new(stream: S) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            inner: Mutex::new(ConnectionInner {
                stream,
                jobq: ConnectionJobQueue::default(),
                state: ConnectionState::Active,
            }),
            bev_freed: AtomicBool::new(false),
        }
    }

    /// Stable identifier used only for logging.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Locks the connection, granting exclusive access to its stream and
    /// job queue. Callers that subsequently call [`crate::joblist::JobList::append`]
    /// on this connection are the "event-loop thread holding the
    /// bufferevent lock" referred to by spec.md §4.1's precondition. The
    /// returned guard records this connection's id so `append` can assert
    /// it wasn't locked from a different connection.
    pub fn lock(&self) -> ConnectionGuard<'_, S> {
        let guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!(connection = self.id, "connection lock poisoned, recovering");
                poisoned.into_inner()
            }
        };
        ConnectionGuard {
            connection_id: self.id,
            guard,
        }
    }

    /// Transitions the connection to `Ending`. Future appends are dropped;
    /// already-queued jobs are skipped by the next worker to drain them.
    pub fn mark_ending(&self) {
        self.lock().state = ConnectionState::Ending;
    }

    /// Marks the underlying stream as released. Appending afterwards trips
    /// a debug assertion in [`crate::joblist::JobList::append`].
    pub fn mark_bev_freed(&self) {
        self.bev_freed.store(true, Ordering::Release);
    }

    pub(crate) fn is_bev_freed(&self) -> bool {
        self.bev_freed.load(Ordering::Acquire)
    }
}

/// RAII guard returned by [`Connection::lock`], granting mutable access to
/// the connection's stream, state, and job queue.
///
/// Carries the id of the [`Connection`] it was locked from so that APIs
/// taking both a `&Arc<Connection<S>>` and a `ConnectionGuard` (notably
/// [`crate::joblist::JobList::append`]) can assert the guard actually
/// belongs to that connection, rather than trusting the two parameters
/// were passed in agreement.
pub struct ConnectionGuard<'a, S: ByteStream> {
    pub(crate) connection_id: u64,
    guard: MutexGuard<'a, ConnectionInner<S>>,
}

impl<'a, S: ByteStream> ConnectionGuard<'a, S> {
    /// The id of the connection this guard was locked from.
    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }
}

impl<'a, S: ByteStream> Deref for ConnectionGuard<'a, S> {
    type Target = ConnectionInner<S>;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl<'a, S: ByteStream> DerefMut for ConnectionGuard<'a, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}
