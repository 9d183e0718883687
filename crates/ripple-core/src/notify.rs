// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Skip notifications for pruned cells.

use core::fmt;

use ripple_geom::CellId;
use tracing::debug;

type SkipCallback = Box<dyn FnMut(CellId) + Send>;

/// Synchronous subscriber list fired whenever a cell is pruned.
///
/// Subscribers run in subscription order on the thread that pulls the
/// broadcast. They observe skips only; nothing they do feeds back into the
/// traversal.
#[derive(Default)]
pub struct SkipNotifier {
    subscribers: Vec<SkipCallback>,
}

impl SkipNotifier {
    /// Creates a notifier with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for every subsequent skip.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(CellId) + Send + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub(crate) fn emit(&mut self, cell: CellId) {
        debug!(%cell, "skip cell");
        for subscriber in &mut self.subscribers {
            subscriber(cell);
        }
    }
}

impl fmt::Debug for SkipNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkipNotifier")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn delivers_to_every_subscriber_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut notifier = SkipNotifier::new();
        for tag in ["a", "b"] {
            let seen = Arc::clone(&seen);
            notifier.subscribe(move |cell| {
                if let Ok(mut log) = seen.lock() {
                    log.push((tag, cell));
                }
            });
        }
        assert_eq!(notifier.subscriber_count(), 2);
        notifier.emit(CellId::new(7));
        let log = seen.lock().map(|l| l.clone()).unwrap_or_default();
        assert_eq!(log, vec![("a", CellId::new(7)), ("b", CellId::new(7))]);
    }
}
