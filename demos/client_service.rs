//! Example resolving a small object graph with #[derive(Inject)]
//!
//! Run with:
//!   cargo run --example client_service
//!
//! Add `--features logging-pretty` to see the resolver's own events.

use graph_injector::{DiError, Inject, Resolver, Slot};

#[allow(dead_code)]
#[derive(Inject)]
struct Settings {
    endpoint: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.example.com".into(),
        }
    }
}

// Service with an injected dependency
#[derive(Default, Inject)]
struct Service {
    #[inject]
    settings: Slot<Settings>,
}

impl Service {
    fn do_work(&self) -> String {
        format!("Service is working against {}", self.settings.endpoint)
    }
}

#[derive(Default, Inject)]
struct Client {
    #[inject]
    service: Slot<Service>,
}

impl Client {
    fn do_work(&self) -> String {
        format!("Client delegates: {}", self.service.do_work())
    }
}

// Two types that need each other
#[derive(Default, Inject)]
struct Chicken {
    #[inject]
    _egg: Slot<Egg>,
}

#[derive(Default, Inject)]
struct Egg {
    #[inject]
    _chicken: Slot<Chicken>,
}

fn main() {
    #[cfg(feature = "logging")]
    graph_injector::logging::init();

    println!("=== Graph Injector Resolve Demo ===\n");

    let resolver = Resolver::new();

    println!("Resolving Client...");
    let client = resolver.resolve::<Client>().expect("Failed to resolve Client");
    println!("  {}", client.do_work());
    println!();

    println!("Resolving Chicken...");
    match resolver.resolve::<Chicken>() {
        Ok(_) => println!("  unexpectedly resolved"),
        Err(err @ DiError::CyclicDependency { .. }) => println!("  {err}"),
        Err(err) => println!("  failed: {err}"),
    }
    println!();

    println!("Described types: {}", resolver.registry().len());
    println!("=== Demo Complete ===");
}
