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

//! A single deferred callback invocation for a connection.

use std::sync::Arc;

use crate::connection::Connection;
use crate::stream::ByteStream;

/// The 16-bit event mask passed to event callbacks. Meaningless for data
/// callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventFlags(pub u16);

impl EventFlags {
    /// No bits set.
    pub const NONE: EventFlags = EventFlags(0);

    /// True if `other`'s bits are a subset of `self`'s.
    pub fn contains(self, other: EventFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// The callback shape carried by a [`Job`]: either a plain data-ready
/// callback, or one that also receives the triggering event mask.
///
/// Both variants are plain function pointers rather than trait objects:
/// coalescing (see [`crate::queue::ConnectionJobQueue`]) compares callback
/// *identity*, which for a closure would require capturing state we have no
/// way to compare. Function pointers implement `PartialEq` by address,
/// matching the C original's comparison of `j->cb`/`j->cbe`.
pub enum Callback<S: ByteStream> {
    /// `(stream, connection) -> ()`
    Data(fn(&S, &Arc<Connection<S>>)),
    /// `(stream, events, connection) -> ()`
    Event(fn(&S, EventFlags, &Arc<Connection<S>>)),
}

impl<S: ByteStream> Clone for Callback<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ByteStream> Copy for Callback<S> {}

impl<S: ByteStream> PartialEq for Callback<S> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callback::Data(a), Callback::Data(b)) => std::ptr::eq(*a as *const (), *b as *const ()),
            (Callback::Event(a), Callback::Event(b)) => std::ptr::eq(*a as *const (), *b as *const ()),
            _ => false,
        }
    }
}

impl<S: ByteStream> std::fmt::Debug for Callback<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Callback::Data(_) => write!(f, "Callback::Data(..)"),
            Callback::Event(_) => write!(f, "Callback::Event(..)"),
        }
    }
}

/// One queued callback invocation. The `arg` attribute from the spec is not
/// stored here: a job always lives inside the queue of the connection that
/// owns it, so the connection is implicit and supplied by the dispatcher at
/// invocation time rather than carried on each job.
#[derive(Debug)]
pub struct Job<S: ByteStream> {
    pub(crate) callback: Callback<S>,
    pub(crate) events: EventFlags,
}

impl<S: ByteStream> Job<S> {
    pub(crate) fn new(callback: Callback<S>, events: EventFlags) -> Self {
        Self { callback, events }
    }

    /// Does this job have the same callback identity and event mask as
    /// `callback`/`events`? Used by the append path to decide coalescing.
    pub(crate) fn matches(&self, callback: &Callback<S>, events: EventFlags) -> bool {
        &self.callback == callback && self.events == events
    }

    pub(crate) fn invoke(&self, stream: &S, connection: &Arc<Connection<S>>) {
        match self.callback {
            Callback::Data(f) => f(stream, connection),
            Callback::Event(f) => f(stream, self.events, connection),
        }
    }
}
