#![no_main]

//! Fuzz target for handler chains
//!
//! Runs calls through chains of hooks that may veto, and checks hook order
//! and that results and errors come back untouched.

use arbitrary::Arbitrary;
use graph_injector::{
    Arguments, BoxError, CallHandler, HandlerChain, InterceptError, Invocation, InvocationRecord,
    Outcome,
};
use libfuzzer_sys::fuzz_target;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
enum CallError {
    #[error("target failed with {0}")]
    Target(u8),
    #[error("vetoed by {0}")]
    Vetoed(&'static str),
    #[error("unknown operation")]
    Unknown,
}

impl From<InterceptError> for CallError {
    fn from(error: InterceptError) -> Self {
        match error {
            InterceptError::Hook { handler, .. } => CallError::Vetoed(handler),
            InterceptError::UnknownOperation { .. } => CallError::Unknown,
        }
    }
}

#[derive(Debug, PartialEq)]
enum Event {
    Before(usize),
    Call,
    After(usize, bool),
}

const NAMES: [&str; 8] = ["h0", "h1", "h2", "h3", "h4", "h5", "h6", "h7"];

struct Hook {
    index: usize,
    veto: bool,
    events: Arc<Mutex<Vec<Event>>>,
}

impl CallHandler for Hook {
    fn name(&self) -> &'static str {
        NAMES[self.index]
    }

    fn before(&self, _call: &Invocation<'_>) -> Result<(), BoxError> {
        self.events.lock().unwrap().push(Event::Before(self.index));
        if self.veto {
            return Err("veto".into());
        }
        Ok(())
    }

    fn after(&self, record: &InvocationRecord<'_>) {
        let ok = matches!(record.outcome(), Outcome::Returned(_));
        self.events.lock().unwrap().push(Event::After(self.index, ok));
    }
}

#[derive(Debug, Arbitrary)]
struct Input {
    vetoes: Vec<bool>,
    args: Vec<i16>,
    outcome: Result<i64, u8>,
}

fuzz_target!(|input: Input| {
    let events = Arc::new(Mutex::new(Vec::new()));
    let hooks = input.vetoes.len().min(NAMES.len());

    let mut builder = HandlerChain::builder();
    for (index, veto) in input.vetoes.iter().take(hooks).enumerate() {
        builder = builder.with(Hook {
            index,
            veto: *veto,
            events: Arc::clone(&events),
        });
    }
    let chain = builder.build();

    let debug_args: Vec<&dyn std::fmt::Debug> =
        input.args.iter().map(|a| a as &dyn std::fmt::Debug).collect();
    let args = Arguments::new(&debug_args);
    assert_eq!(args.len(), input.args.len());

    let expected = input.outcome.map_err(CallError::Target);
    let result = chain.around("op", args, || {
        events.lock().unwrap().push(Event::Call);
        expected.clone()
    });

    let events = events.lock().unwrap();
    let first_veto = input.vetoes.iter().take(hooks).position(|veto| *veto);

    match first_veto {
        Some(vetoed) => {
            assert_eq!(result, Err(CallError::Vetoed(NAMES[vetoed])));
            let wanted: Vec<_> = (0..=vetoed).map(Event::Before).collect();
            assert_eq!(*events, wanted);
        }
        None => {
            assert_eq!(result, expected);
            let ok = expected.is_ok();
            let mut wanted: Vec<_> = (0..hooks).map(Event::Before).collect();
            wanted.push(Event::Call);
            wanted.extend((0..hooks).map(|index| Event::After(index, ok)));
            assert_eq!(*events, wanted);
        }
    }
});
