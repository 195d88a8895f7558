use crate::domain::event::{CallbackOutcome, OutcomeKind};
use crate::domain::ports::ReactorArc;
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;

/// Ordered registry of reactors per outcome kind.
///
/// Dispatch is sequential: each reactor finishes before the next one starts,
/// and a reactor that errors or panics is logged and skipped over.
#[derive(Default, Clone)]
pub struct EventBus {
    subscribers: HashMap<OutcomeKind, Vec<ReactorArc>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `reactor` to the dispatch list for `kind`.
    pub fn subscribe(&mut self, kind: OutcomeKind, reactor: ReactorArc) {
        tracing::debug!(reactor = reactor.name(), ?kind, "reactor subscribed");
        self.subscribers.entry(kind).or_default().push(reactor);
    }

    pub fn subscriber_count(&self, kind: OutcomeKind) -> usize {
        self.subscribers.get(&kind).map_or(0, Vec::len)
    }

    /// Delivers `event` to every reactor subscribed to its kind.
    ///
    /// Returns how many reactors completed without error.
    pub async fn publish(&self, event: &mut CallbackOutcome) -> usize {
        let kind = event.kind();
        let Some(reactors) = self.subscribers.get(&kind) else {
            return 0;
        };

        let mut completed = 0;
        for reactor in reactors {
            match AssertUnwindSafe(reactor.react(event)).catch_unwind().await {
                Ok(Ok(())) => completed += 1,
                Ok(Err(e)) => {
                    tracing::warn!(reactor = reactor.name(), ?kind, error = %e, "reactor failed");
                }
                Err(panic) => {
                    tracing::error!(
                        reactor = reactor.name(),
                        ?kind,
                        panic = panic_message(panic.as_ref()),
                        "reactor panicked"
                    );
                }
            }
        }
        completed
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
