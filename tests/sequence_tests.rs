// Copyright 2024 OctoFHIR Team
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

//! Sequential values across document builds
//!
//! Each sequential value owns one atomic counter. Document trees are built per
//! thread and never shared; the counter is the only state crossing documents.

use octofhir_fixtures::{Factory, Sequence, Template, sequence, sequence_from, wrap};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;
use std::thread;

#[rstest]
#[case(1)]
#[case(5)]
#[case(50)]
fn test_counter_yields_one_to_n(#[case] documents: u64) {
    let id = sequence(|n| n);

    let seen: Vec<u64> = (0..documents)
        .map(|_| {
            let doc = wrap(Template::object([("id", id.clone())])).unwrap();
            doc.get("id").unwrap().as_u64().unwrap()
        })
        .collect();

    assert_eq!(seen, (1..=documents).collect::<Vec<_>>());
}

#[test]
fn test_repeated_reads_do_not_advance_counter() {
    let counter = Arc::new(Sequence::new());
    let doc = wrap(Template::object([(
        "id",
        sequence_from(Arc::clone(&counter), |n| n),
    )]))
    .unwrap();

    doc.get("id").unwrap();
    doc.get("id").unwrap();
    doc.resolve().unwrap();
    assert_eq!(counter.current(), 1);
}

#[test]
fn test_independent_sequences_have_independent_counters() {
    let factory = Factory::new("encounter")
        .attr("id", sequence(|n| format!("enc-{n}")))
        .attr("period", Template::object([("index", sequence(|n| n))]));

    factory.build().unwrap();
    let doc = factory.build().unwrap();
    assert_eq!(doc, json!({"id": "enc-2", "period": {"index": 2}}));

    let other = Factory::new("encounter").attr("id", sequence(|n| format!("enc-{n}")));
    assert_eq!(other.build().unwrap(), json!({"id": "enc-1"}));
}

#[test]
fn test_concurrent_builds_never_repeat_numbers() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 25;

    let factory = Factory::new("patient").attr("id", sequence(|n| n));

    let mut ids: Vec<u64> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    factory
                        .build_many(PER_THREAD)
                        .unwrap()
                        .into_iter()
                        .map(|doc| doc["id"].as_u64().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect()
    });

    ids.sort_unstable();
    let expected: Vec<u64> = (1..=(THREADS * PER_THREAD) as u64).collect();
    assert_eq!(ids, expected);
}
