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

//! Throughput of [`JobList::append`] on the producer side only (no worker
//! threads running), comparing the always-coalescing case against a case
//! where every append is distinct and actually grows the queue.

use std::sync::Arc;

use caster_jobs::connection::Connection;
use caster_jobs::deferred::NoopDeferredRun;
use caster_jobs::job::{Callback, EventFlags};
use caster_jobs::joblist::JobList;
use caster_jobs::stream::ByteStream;
use criterion::{criterion_group, criterion_main, Criterion};

#[derive(Debug, Default)]
struct BenchStream;

impl ByteStream for BenchStream {}

fn data_cb(_stream: &BenchStream, _connection: &Arc<Connection<BenchStream>>) {}

fn event_cb(_stream: &BenchStream, _events: EventFlags, _connection: &Arc<Connection<BenchStream>>) {}

/// So `tracing::trace!`/`tracing::error!` calls on the append path show up
/// when this bench is run with `RUST_LOG` set, instead of being silently
/// dropped for want of a subscriber.
fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("caster_jobs=trace").try_init();
}

fn bench_coalescing_appends(c: &mut Criterion) {
    init_tracing();
    let joblist = JobList::new(Arc::new(NoopDeferredRun));
    let connection = Arc::new(Connection::new(BenchStream));

    c.bench_function("append/coalescing", |b| {
        b.iter(|| {
            let mut guard = connection.lock();
            joblist
                .append(&connection, &mut guard, Callback::Data(data_cb), EventFlags::NONE)
                .unwrap();
        })
    });
}

fn bench_distinct_appends(c: &mut Criterion) {
    init_tracing();
    let joblist = JobList::new(Arc::new(NoopDeferredRun));
    let connection = Arc::new(Connection::new(BenchStream));
    let mut toggle = false;

    c.bench_function("append/distinct", |b| {
        b.iter(|| {
            let mut guard = connection.lock();
            toggle = !toggle;
            let events = if toggle { EventFlags(0x01) } else { EventFlags(0x02) };
            joblist
                .append(&connection, &mut guard, Callback::Event(event_cb), events)
                .unwrap();
            // Keep the queue from growing without bound across iterations;
            // this isolates append's own cost from allocator pressure.
            JobList::<BenchStream>::drain(&mut guard);
        })
    });
}

criterion_group!(benches, bench_coalescing_appends, bench_distinct_appends);
criterion_main!(benches);
