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

//! `mio`-backed [`ByteStream`], generalizing the `Session` type from the
//! teacher crate's `server/src/sessions.rs`.

use std::io::{Read, Result, Write};

use mio::event::Source;
use mio::{net::TcpStream, Interest, Registry, Token};

use crate::stream::ByteStream;

/// A socket wrapped for use as a connection's [`ByteStream`]. Unlike
/// `sessions.rs`'s `Session`, this crate's scheduler never reads or writes
/// through the stream itself — callbacks do, after locking the owning
/// [`crate::connection::Connection`] — so no read/write buffer lives here.
/// It exists purely to give `register`/`reregister`/`deregister` a concrete
/// `mio::event::Source` to drive from an event loop.
#[derive(Debug)]
pub struct MioStream {
    inner: TcpStream,
}

impl MioStream {
    /// Wraps an already-accepted or already-connected socket.
    pub fn new(inner: TcpStream) -> Self {
        Self { inner }
    }

    /// Borrows the underlying socket for reading/writing.
    pub fn get_mut(&mut self) -> &mut TcpStream {
        &mut self.inner
    }
}

impl Read for MioStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for MioStream {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}

impl Source for MioStream {
    fn register(&mut self, registry: &Registry, token: Token, interests: Interest) -> Result<()> {
        self.inner.register(registry, token, interests)
    }

    fn reregister(&mut self, registry: &Registry, token: Token, interests: Interest) -> Result<()> {
        self.inner.reregister(registry, token, interests)
    }

    fn deregister(&mut self, registry: &Registry) -> Result<()> {
        self.inner.deregister(registry)
    }
}

impl ByteStream for MioStream {}
