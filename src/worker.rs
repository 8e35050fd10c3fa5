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

//! Fixed-size pool of threads that all run [`JobList::run`].

use std::sync::Arc;
use std::thread::JoinHandle;

use crate::error::JobsError;
use crate::joblist::JobList;
use crate::stream::ByteStream;

/// The only tunables this core exposes: worker count and worker stack
/// size (spec.md §6). Defaults mirror `jobs_start_threads`: it hardcodes a
/// 500 KiB stack and takes the worker count from the caller.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPoolConfig {
    /// Number of worker threads. Typically 4-16 (spec.md §5).
    pub num_workers: usize,
    /// Stack size per worker, in bytes.
    pub stack_size: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            num_workers: 4,
            stack_size: 500 * 1024,
        }
    }
}

/// A running set of worker threads, all servicing the same [`JobList`].
///
/// There is no graceful shutdown: spec.md's worker entry point runs
/// forever and "returns only on process exit." Dropping a `WorkerPool`
/// detaches its threads rather than joining them, since joining would
/// block forever on threads that are parked waiting for jobs.
#[derive(Debug)]
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `config.num_workers` threads, each running `joblist.run()`
    /// forever (⇔ `jobs_start_threads` + `jobs_start_routine`).
    pub fn start<S: ByteStream>(joblist: Arc<JobList<S>>, config: WorkerPoolConfig) -> Result<Self, JobsError> {
        let mut handles = Vec::with_capacity(config.num_workers);
        for index in 0..config.num_workers {
            let joblist = Arc::clone(&joblist);
            let handle = std::thread::Builder::new()
                .name(format!("ntrip-worker-{index}"))
                .stack_size(config.stack_size)
                .spawn(move || jobs_start_routine(joblist))?;
            handles.push(handle);
        }
        Ok(Self { handles })
    }

    /// Number of worker threads currently tracked by this pool.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// True if this pool has no worker threads (only possible if
    /// constructed with `num_workers: 0`, which is otherwise a misuse).
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// A worker thread's main routine: log a start message, then run the
/// scheduler loop forever. Mirrors `jobs_start_routine`.
fn jobs_start_routine<S: ByteStream>(joblist: Arc<JobList<S>>) {
    tracing::info!(thread = ?std::thread::current().id(), "started worker thread");
    joblist.run();
}
