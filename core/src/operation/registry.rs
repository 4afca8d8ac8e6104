use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;

use crate::errors::OperationError;

use super::status::{OperationStatus, Transition};

pub const DEFAULT_RETAINED_OPERATIONS: usize = 1024;

/// Shared, in-memory status store for long-running operations.
///
/// Each id owns a `watch` channel. Writers go through [`advance`](Self::advance),
/// which enforces the monotonic lifecycle under the channel's own lock, so a
/// reader can never observe a state earlier than one already published.
///
/// At most `retain` entries are kept. When a new operation would exceed that,
/// the oldest terminal entries are evicted; running operations never are.
#[derive(Clone)]
pub struct OperationRegistry {
    inner: Arc<RwLock<Entries>>,
}

struct Entries {
    senders: HashMap<String, watch::Sender<OperationStatus>>,
    order: VecDeque<String>,
    retain: usize,
}

impl Entries {
    fn evict_terminal(&mut self) {
        while self.senders.len() > self.retain {
            let Some(pos) = self
                .order
                .iter()
                .position(|id| self.senders.get(id).is_some_and(|tx| tx.borrow().is_terminal()))
            else {
                break;
            };
            if let Some(id) = self.order.remove(pos) {
                self.senders.remove(&id);
                tracing::debug!(target: "kiln.operation", id = %id, "evicted terminal operation");
            }
        }
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETAINED_OPERATIONS)
    }
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retain: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Entries {
                senders: HashMap::new(),
                order: VecDeque::new(),
                retain: retain.max(1),
            })),
        }
    }

    pub fn begin(&self, id: impl Into<String>, initial: OperationStatus) -> Result<(), OperationError> {
        let id = id.into();
        let mut entries = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if entries.senders.contains_key(&id) {
            return Err(OperationError::AlreadyExists { id });
        }
        let (tx, _rx) = watch::channel(initial);
        entries.senders.insert(id.clone(), tx);
        entries.order.push_back(id);
        entries.evict_terminal();
        Ok(())
    }

    pub fn advance(&self, id: &str, next: OperationStatus) -> Result<(), OperationError> {
        let tx = self.sender(id)?;
        let mut outcome = Ok(());
        tx.send_if_modified(|current| match current.check_transition(&next) {
            Ok(Transition::Changed) => {
                tracing::debug!(
                    target: "kiln.operation",
                    id,
                    from = current.name(),
                    to = next.name(),
                    "operation advanced"
                );
                *current = next;
                true
            }
            Ok(Transition::Unchanged) => false,
            Err((from, to)) => {
                outcome = Err(if current.is_terminal() {
                    OperationError::AlreadyTerminal {
                        id: id.to_string(),
                        current: from,
                    }
                } else {
                    OperationError::Regression {
                        id: id.to_string(),
                        from,
                        to,
                    }
                });
                false
            }
        });
        outcome
    }

    pub fn get(&self, id: &str) -> Option<OperationStatus> {
        let entries = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        entries.senders.get(id).map(|tx| tx.borrow().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        let entries = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        entries.senders.contains_key(id)
    }

    /// Resolve once the operation reaches a terminal state.
    pub async fn wait_terminal(&self, id: &str) -> Result<OperationStatus, OperationError> {
        let mut rx = self.sender(id)?.subscribe();
        let status = rx
            .wait_for(OperationStatus::is_terminal)
            .await
            .map_err(|_| OperationError::NotFound { id: id.to_string() })?;
        Ok(status.clone())
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .senders
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sender(&self, id: &str) -> Result<watch::Sender<OperationStatus>, OperationError> {
        let entries = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .senders
            .get(id)
            .cloned()
            .ok_or_else(|| OperationError::NotFound { id: id.to_string() })
    }
}
