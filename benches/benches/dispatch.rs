// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use fragment_router::{Pipeline, Router};
use fragment_router_filters::{check, equals, has_prefix, matches};
use regex::Regex;

/// `n` routes accepting `page{i}` exactly; each records its index as output.
fn flat_router(n: usize) -> Router {
    let router = Router::new();
    for i in 0..n {
        router.route(
            Pipeline::new()
                .then(check(equals(format!("page{i}"))))
                .then(move |req| {
                    req.set_output(i);
                    Ok(())
                }),
        );
    }
    router
}

/// A chain of `depth` routers mounted under `s{level}/`, with a leaf route at the end.
fn nested_router(depth: usize) -> (Router, String) {
    let routers: Vec<Router> = (0..=depth).map(|_| Router::new()).collect();
    let mut identifier = String::new();
    for (level, pair) in routers.windows(2).enumerate() {
        let prefix = format!("s{level}/");
        identifier.push_str(&prefix);
        pair[0].route(Pipeline::new().then(check(equals("never"))));
        pair[0].mount(prefix, &pair[1]);
    }
    routers[depth].route(Pipeline::new().then(|_| Ok(())));
    identifier.push_str("leaf");
    (routers[0].clone(), identifier)
}

fn bench_flat(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat");
    for &n in &[8_usize, 64, 512] {
        let router = flat_router(n);
        let last = format!("page{}", n - 1);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("last_of_n{n}"), |b| {
            b.iter(|| black_box(router.dispatch(black_box(&last))));
        });
        group.bench_function(format!("first_of_n{n}"), |b| {
            b.iter(|| black_box(router.dispatch(black_box("page0"))));
        });
        group.bench_function(format!("unmatched_n{n}"), |b| {
            b.iter(|| black_box(router.dispatch(black_box("nowhere"))));
        });
    }
    group.finish();
}

fn bench_nested(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested");
    for &depth in &[1_usize, 4, 16] {
        let (router, identifier) = nested_router(depth);
        group.bench_function(format!("depth{depth}"), |b| {
            b.iter(|| black_box(router.dispatch(black_box(&identifier))));
        });
    }
    group.finish();
}

fn bench_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("filters");
    let router = Router::new();
    router
        .route(
            Pipeline::new()
                .then(check(has_prefix("users/")))
                .then(check(matches(
                    Regex::new(r"^(?<user>[a-z]+)/posts/(?<post>\d+)$").expect("valid pattern"),
                ))),
        )
        .route(Pipeline::new().then(|_| Ok(())));
    group.bench_function("regex_params", |b| {
        b.iter(|| black_box(router.dispatch(black_box("users/ada/posts/42"))));
    });
    group.bench_function("prefix_miss", |b| {
        b.iter(|| black_box(router.dispatch(black_box("about"))));
    });
    group.finish();
}

criterion_group!(benches, bench_flat, bench_nested, bench_filters);
criterion_main!(benches);
