//! Shell-local search text.

use std::sync::Arc;
use tokio::sync::watch;

/// The search text owned by a page shell.
///
/// Starts empty. Reads go through [`SearchState::current`]; writes go through a
/// [`SearchHandle`], and every effective write wakes
/// [`SearchState::changed`].
#[derive(Debug)]
pub struct SearchState {
    tx: Arc<watch::Sender<String>>,
    rx: watch::Receiver<String>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchState {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(String::new());
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    pub fn current(&self) -> String {
        self.rx.borrow().clone()
    }

    pub fn handle(&self) -> SearchHandle {
        SearchHandle {
            tx: self.tx.clone(),
        }
    }

    /// Wait for the next change and mark it seen.
    pub async fn changed(&mut self) -> String {
        // The state holds a sender, so the channel cannot close under us.
        let _ = self.rx.changed().await;
        self.rx.borrow_and_update().clone()
    }
}

/// Update callback for the search text, handed to the header.
#[derive(Debug, Clone)]
pub struct SearchHandle {
    tx: Arc<watch::Sender<String>>,
}

impl SearchHandle {
    /// Replace the search text. Returns false if it was already `query`.
    pub fn set(&self, query: impl Into<String>) -> bool {
        let query = query.into();
        self.tx.send_if_modified(|current| {
            if *current == query {
                false
            } else {
                *current = query;
                true
            }
        })
    }
}
