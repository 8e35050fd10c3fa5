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

//! Error types for the job dispatch core.

/// Failure modes surfaced by this crate.
///
/// Out-of-memory on a single job allocation is recoverable (the event
/// library will redeliver readiness), so it is not fatal on its own; it is
/// returned here only so callers can log it at the right level.
#[derive(Debug, thiserror::Error)]
pub enum JobsError {
    /// Allocating or enqueuing a [`crate::job::Job`] failed.
    #[error("out of memory allocating a job")]
    OutOfMemory,

    /// Spawning a worker thread failed; startup should abort.
    #[error("failed to start worker thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),
}
