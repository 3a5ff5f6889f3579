//! Benchmarks for knowledge-base operations.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use plan_kb::domain::DomainSpec;
use plan_kb::instance::Instance;
use plan_kb::kb::KnowledgeBase;
use plan_kb::tree::{Predicate, Tree};

const ROOMS: usize = 200;

fn grid_kb() -> KnowledgeBase {
    let domain = DomainSpec::new("grid")
        .with_type("robot", "object")
        .with_type("room", "object")
        .with_predicate("robot_at", ["robot", "room"])
        .with_predicate("connected", ["room", "room"])
        .with_function("distance", ["room", "room"])
        .build()
        .unwrap();
    let mut kb = KnowledgeBase::new(Arc::new(domain));
    kb.add_instance(Instance::new("r", "robot")).unwrap();
    for i in 0..ROOMS {
        kb.add_instance(Instance::new(format!("room{i}"), "room")).unwrap();
    }
    for i in 1..ROOMS {
        let (a, b) = (format!("room{}", i - 1), format!("room{i}"));
        kb.add_predicate(Predicate::new("connected", [a.as_str(), b.as_str()]))
            .unwrap();
    }
    kb.add_predicate(Predicate::new("robot_at", ["r", "room0"])).unwrap();
    kb
}

fn bench_goal_check(c: &mut Criterion) {
    let kb = grid_kb();
    let goal = Tree::and(
        (1..ROOMS)
            .map(|i| {
                let (a, b) = (format!("room{}", i - 1), format!("room{i}"));
                Tree::from_predicate(Predicate::new("connected", [a, b]))
            })
            .collect(),
    );

    c.bench_function("goal_check_200", |bench| {
        bench.iter(|| black_box(kb.is_goal_satisfied(&goal)))
    });
}

fn bench_emit_and_ingest(c: &mut Criterion) {
    let kb = grid_kb();
    let text = kb.get_problem();

    c.bench_function("emit_problem_200", |bench| {
        bench.iter(|| black_box(kb.get_problem()))
    });
    c.bench_function("ingest_problem_200", |bench| {
        bench.iter(|| {
            let mut fresh = KnowledgeBase::new(kb.domain_handle());
            black_box(fresh.add_problem(&text).unwrap())
        })
    });
}

fn bench_cascade(c: &mut Criterion) {
    let kb = grid_kb();

    c.bench_function("remove_instance_cascade", |bench| {
        bench.iter_with_setup(
            || {
                let mut copy = KnowledgeBase::new(kb.domain_handle());
                copy.add_problem(&kb.get_problem()).unwrap();
                copy
            },
            |mut copy| black_box(copy.remove_instance("room100")),
        )
    });
}

criterion_group!(benches, bench_goal_check, bench_emit_and_ingest, bench_cascade);
criterion_main!(benches);
