#![no_main]

//! Fuzz target for graph resolution
//!
//! Builds descriptors for four node types with arbitrary marked edges and
//! checks that resolution fails with a cycle exactly when one is reachable
//! from the root.

use graph_injector::{Resolver, Slot, TypeDescriptor, TypeKey};
use libfuzzer_sys::fuzz_target;

const NODES: usize = 4;

#[derive(Default)]
struct Node<const I: usize> {
    s0: Slot<Node<0>>,
    s1: Slot<Node<1>>,
    s2: Slot<Node<2>>,
    s3: Slot<Node<3>>,
}

fn describe<const I: usize>(edges: [bool; NODES]) -> TypeDescriptor {
    let builder = TypeDescriptor::builder::<Node<I>>().default_constructor();
    let builder = if edges[0] {
        builder.inject_registered::<Node<0>>("s0", |n: &Node<I>| &n.s0)
    } else {
        builder.slot::<Node<0>>("s0", |n: &Node<I>| &n.s0)
    };
    let builder = if edges[1] {
        builder.inject_registered::<Node<1>>("s1", |n: &Node<I>| &n.s1)
    } else {
        builder.slot::<Node<1>>("s1", |n: &Node<I>| &n.s1)
    };
    let builder = if edges[2] {
        builder.inject_registered::<Node<2>>("s2", |n: &Node<I>| &n.s2)
    } else {
        builder.slot::<Node<2>>("s2", |n: &Node<I>| &n.s2)
    };
    let builder = if edges[3] {
        builder.inject_registered::<Node<3>>("s3", |n: &Node<I>| &n.s3)
    } else {
        builder.slot::<Node<3>>("s3", |n: &Node<I>| &n.s3)
    };
    builder.build()
}

/// Depth-first search for a cycle reachable from `node`
fn reaches_cycle(edges: &[[bool; NODES]; NODES], node: usize, path: &mut Vec<usize>) -> bool {
    if path.contains(&node) {
        return true;
    }
    path.push(node);
    let found = (0..NODES).any(|next| edges[node][next] && reaches_cycle(edges, next, path));
    path.pop();
    found
}

fuzz_target!(|edges: [[bool; NODES]; NODES]| {
    let resolver = Resolver::new();
    resolver.register(describe::<0>(edges[0]));
    resolver.register(describe::<1>(edges[1]));
    resolver.register(describe::<2>(edges[2]));
    resolver.register(describe::<3>(edges[3]));

    let result = resolver.resolve_key(&TypeKey::opaque::<Node<0>>());

    if reaches_cycle(&edges, 0, &mut Vec::new()) {
        assert!(result.err().is_some_and(|err| err.is_cyclic()));
    } else {
        let root = result.ok().and_then(|any| any.downcast::<Node<0>>().ok());
        let root = root.expect("acyclic graph must resolve");
        assert_eq!(root.s1.is_filled(), edges[0][1]);
        assert_eq!(root.s2.is_filled(), edges[0][2]);
        assert_eq!(root.s3.is_filled(), edges[0][3]);
    }
});
