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

//! The deferred-cleanup hook a worker runs once per iteration.

/// Mirrors `ntrip_deferred_run(caster, tag)`: a hook the worker loop calls
/// once per iteration, after releasing a connection's lock, so that
/// connections queued for deletion while a worker held them can be
/// destroyed safely.
///
/// `tag` identifies the call site, matching the original's `"joblist_run"`
/// literal, useful for telling apart deferred-cleanup passes triggered from
/// different places if the embedding caster has more than one.
pub trait DeferredRun: Send + Sync {
    /// Runs one deferred-cleanup pass.
    fn run(&self, tag: &str);
}

/// A [`DeferredRun`] that does nothing, for embedders with no deferred
/// connection teardown of their own (e.g. most tests).
#[derive(Debug, Default)]
pub struct NoopDeferredRun;

impl DeferredRun for NoopDeferredRun {
    fn run(&self, _tag: &str) {}
}
