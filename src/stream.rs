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

//! Abstraction over the event library's per-connection object.
//!
//! The scheduler never reads or writes bytes itself — callbacks do that.
//! All the scheduler needs is something `Send + Sync` it can hand to a
//! callback and hold behind a connection's lock, generalizing the role
//! `bufferevent` plays in the original source and `TcpStream` plays in
//! `net/tcp_stream.rs` of the teacher crate.

/// A per-connection byte stream: a socket, its buffers, and its timers, as
/// seen from the scheduler. The scheduler places no requirements on it
/// beyond thread-safety, since it is always accessed behind a connection's
/// own lock. Implement this for whatever the embedding event loop actually
/// hands out; see `net::MioStream` for a concrete `mio`-backed example.
pub trait ByteStream: Send + Sync + 'static {}

impl ByteStream for mio::net::TcpStream {}
impl ByteStream for std::net::TcpStream {}
