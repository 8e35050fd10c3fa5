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

#![deny(missing_docs, rust_2018_idioms, unused_imports)]

//! `caster-jobs` is the job dispatch core of an NTRIP caster: the scheduler
//! that hands per-connection I/O callbacks from a single event-loop thread
//! off to a fixed-size pool of worker threads, serializing all callbacks
//! for one connection while allowing different connections to run in
//! parallel.
//!
//! This crate does not implement the NTRIP protocol, the event library's
//! socket multiplexing, or TLS/config/CLI concerns — it models those as
//! the external collaborators described in the module docs below. What it
//! does own is the hard part: the two-queue append/work hand-off between
//! the producer and the workers, per-connection callback batching with
//! adjacent-duplicate coalescing, the lock-order discipline that avoids
//! deadlock against the event library's own per-connection lock, and clean
//! teardown of in-flight jobs when a connection is being destroyed.
//!
//! # Layout
//!
//! - [`job`] — a single deferred callback invocation ([`job::Job`]).
//! - [`queue`] — the per-connection FIFO of pending jobs
//!   ([`queue::ConnectionJobQueue`]).
//! - [`connection`] — a connection: a [`stream::ByteStream`] plus its job
//!   queue, behind one lock ([`connection::Connection`]).
//! - [`joblist`] — the scheduler itself ([`joblist::JobList`]).
//! - [`worker`] — the worker thread pool ([`worker::WorkerPool`]).
//! - [`deferred`] — the per-iteration deferred-cleanup hook.
//! - [`net`] — a concrete `mio`-backed [`stream::ByteStream`].

pub mod connection;
pub mod deferred;
pub mod error;
pub mod job;
pub mod joblist;
pub mod net;
pub mod queue;
pub mod stream;
pub mod worker;
