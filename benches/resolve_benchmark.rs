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

//! Lazy access versus full materialization of fixture trees

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use octofhir_fixtures::{Factory, Template, dependent, sequence, wrap};
use std::hint::black_box;

/// Bundle-like template with `entries` dynamic patient entries
fn bundle_template(entries: usize) -> Template {
    let entry = Template::object([
        (
            "fullUrl",
            dependent(|this| {
                let id = this.pointer("/resource/id")?;
                Ok(format!("urn:uuid:{}", id.as_str().unwrap_or_default()))
            }),
        ),
        (
            "resource",
            Template::object([
                ("resourceType", Template::from("Patient")),
                ("id", sequence(|n| format!("pat-{n}"))),
                (
                    "name",
                    Template::array([Template::object([
                        ("family", Template::from("Doe")),
                        ("given", Template::array(["John", "Q"])),
                    ])]),
                ),
            ]),
        ),
    ]);

    Template::object([
        ("resourceType", Template::from("Bundle")),
        ("type", Template::from("collection")),
        ("entry", Template::array(vec![entry; entries])),
    ])
}

fn bench_materialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("materialize");
    for entries in [10usize, 100, 1000] {
        let template = bundle_template(entries);
        group.bench_with_input(BenchmarkId::from_parameter(entries), &template, |b, t| {
            b.iter(|| {
                let doc = wrap(t.clone()).unwrap();
                black_box(doc.resolve().unwrap())
            })
        });
    }
    group.finish();
}

fn bench_lazy_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("lazy_access");
    for entries in [10usize, 100, 1000] {
        let template = bundle_template(entries);
        group.bench_with_input(BenchmarkId::from_parameter(entries), &template, |b, t| {
            b.iter(|| {
                let doc = wrap(t.clone()).unwrap();
                black_box(doc.pointer("/entry/0/fullUrl").unwrap())
            })
        });
    }
    group.finish();
}

fn bench_factory_build(c: &mut Criterion) {
    let factory = Factory::new("observation")
        .attr("resourceType", "Observation")
        .attr("id", sequence(|n| format!("obs-{n}")))
        .attr("status", "final")
        .attr(
            "code",
            Template::object([(
                "coding",
                Template::array([Template::object([
                    ("system", Template::from("http://loinc.org")),
                    ("code", Template::from("8867-4")),
                ])]),
            )]),
        );

    c.bench_function("factory_build", |b| b.iter(|| black_box(factory.build().unwrap())));
}

criterion_group!(benches, bench_materialize, bench_lazy_access, bench_factory_build);
criterion_main!(benches);
