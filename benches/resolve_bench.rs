//! Benchmarks for graph resolution and intercepted calls

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use graph_injector::{
    Arguments, HandlerChain, InterceptError, Injectable, Interface, InterfaceDescriptor,
    LoggingHandler, Proxy, Registry, Resolver, Slot, TypeDescriptor,
};
use std::hint::black_box;
use std::sync::Arc;

#[derive(Default)]
struct Leaf;

impl Injectable for Leaf {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<Self>().default_constructor().build()
    }
}

#[derive(Default)]
struct Branch {
    left: Slot<Leaf>,
    right: Slot<Leaf>,
}

impl Injectable for Branch {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<Self>()
            .default_constructor()
            .inject::<Leaf>("left", |b: &Branch| &b.left)
            .inject::<Leaf>("right", |b: &Branch| &b.right)
            .build()
    }
}

#[derive(Default)]
struct Root {
    first: Slot<Branch>,
    second: Slot<Branch>,
    leaf: Slot<Leaf>,
}

impl Injectable for Root {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<Self>()
            .default_constructor()
            .inject::<Branch>("first", |r: &Root| &r.first)
            .inject::<Branch>("second", |r: &Root| &r.second)
            .inject::<Leaf>("leaf", |r: &Root| &r.leaf)
            .build()
    }
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");

    let resolver = Resolver::new();
    // Warm the descriptor cache
    let _ = resolver.resolve::<Root>();

    group.throughput(Throughput::Elements(1));
    group.bench_function("leaf", |b| b.iter(|| black_box(resolver.resolve::<Leaf>())));
    group.bench_function("graph_8_nodes", |b| {
        b.iter(|| black_box(resolver.resolve::<Root>()))
    });

    group.bench_function("graph_8_nodes_cold_cache", |b| {
        b.iter(|| black_box(Resolver::new().resolve::<Root>()))
    });

    group.finish();
}

fn bench_concurrent_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");

    let registry = Arc::new(Registry::new());
    let resolver = Resolver::with_registry(Arc::clone(&registry));
    let _ = resolver.resolve::<Root>();

    group.bench_function("4_threads_x_100", |b| {
        b.iter(|| {
            std::thread::scope(|s| {
                for _ in 0..4 {
                    let resolver = resolver.clone();
                    s.spawn(move || {
                        for _ in 0..100 {
                            black_box(resolver.resolve::<Root>().is_ok());
                        }
                    });
                }
            });
        })
    });

    group.finish();
}

trait Adder: Send + Sync {
    fn add(&self, a: u64, b: u64) -> Result<u64, InterceptError>;
}

impl Interface for dyn Adder {
    fn descriptor() -> InterfaceDescriptor {
        InterfaceDescriptor::builder("Adder").operation("add", 2).build()
    }
}

impl Adder for Proxy<dyn Adder> {
    fn add(&self, a: u64, b: u64) -> Result<u64, InterceptError> {
        self.dispatch("add", Arguments::new(&[&a, &b]), |t| t.add(a, b))
    }
}

struct Plain;

impl Adder for Plain {
    fn add(&self, a: u64, b: u64) -> Result<u64, InterceptError> {
        Ok(a.wrapping_add(b))
    }
}

fn bench_interception(c: &mut Criterion) {
    let mut group = c.benchmark_group("interception");

    let target: Arc<dyn Adder> = Arc::new(Plain);
    let bare = Proxy::new(Arc::clone(&target), HandlerChain::new());
    let (logging, log) = LoggingHandler::capturing();
    let logged = Proxy::new(Arc::clone(&target), HandlerChain::builder().with(logging).build());

    group.bench_function("direct", |b| b.iter(|| black_box(target.add(black_box(2), 3))));
    group.bench_function("proxy_empty_chain", |b| {
        b.iter(|| black_box(bare.add(black_box(2), 3)))
    });
    group.bench_function("proxy_logging", |b| {
        b.iter(|| {
            log.clear();
            black_box(logged.add(black_box(2), 3))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_resolution,
    bench_concurrent_resolution,
    bench_interception
);
criterion_main!(benches);
