//! Join barrier over N independent completions
//!
//! Backends that fan a batch out into N engine requests hand each request's
//! completion callback a clone of [`IndexedJoin`]. Every callback writes to its
//! own slot; the paired [`JoinWait`] resolves once the last slot is filled, with
//! values in slot order regardless of completion order. The first failure
//! settles the join immediately.

use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::oneshot;

use crate::error::{StoreError, StoreResult};

struct JoinState<T> {
    slots: Vec<Option<T>>,
    remaining: usize,
    sender: Option<oneshot::Sender<StoreResult<Vec<T>>>>,
}

impl<T> JoinState<T> {
    fn settle(&mut self, result: StoreResult<Vec<T>>) {
        if let Some(sender) = self.sender.take() {
            if sender.send(result).is_err() {
                tracing::debug!("join settled after its waiter was dropped");
            }
        }
    }

    fn settle_ok(&mut self) {
        let values = self.slots.drain(..).flatten().collect();
        self.settle(Ok(values));
    }
}

/// Completion handle shared by the callbacks of one batch.
///
/// Single-threaded: callbacks run on the engine's event loop.
pub struct IndexedJoin<T> {
    state: Rc<RefCell<JoinState<T>>>,
}

impl<T> Clone for IndexedJoin<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

/// Resolves with all slot values once the batch settles.
pub struct JoinWait<T> {
    receiver: oneshot::Receiver<StoreResult<Vec<T>>>,
}

impl<T> IndexedJoin<T> {
    /// Create a barrier over `len` slots. A zero-length join is settled at once.
    pub fn new(len: usize) -> (Self, JoinWait<T>) {
        let (sender, receiver) = oneshot::channel();
        let state = JoinState {
            slots: (0..len).map(|_| None).collect(),
            remaining: len,
            sender: Some(sender),
        };
        let join = Self {
            state: Rc::new(RefCell::new(state)),
        };
        if len == 0 {
            join.state.borrow_mut().settle_ok();
        }
        (join, JoinWait { receiver })
    }

    /// Number of slots that still have to complete.
    pub fn remaining(&self) -> usize {
        self.state.borrow().remaining
    }

    /// Whether the join already resolved or failed.
    pub fn is_settled(&self) -> bool {
        self.state.borrow().sender.is_none()
    }

    /// Fill slot `index`. Completing a slot twice or out of range is ignored.
    pub fn complete(&self, index: usize, value: T) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if state.sender.is_none() {
            return;
        }

        let len = state.slots.len();
        match state.slots.get_mut(index) {
            Some(slot) if slot.is_none() => {
                *slot = Some(value);
                state.remaining -= 1;
            }
            Some(_) => {
                tracing::warn!(index, "join slot completed twice, ignoring");
                return;
            }
            None => {
                tracing::warn!(index, len, "join slot out of range, ignoring");
                return;
            }
        }

        if state.remaining == 0 {
            state.settle_ok();
        }
    }

    /// Settle the join with `err`. Only the first failure is reported.
    pub fn fail(&self, err: StoreError) {
        let mut state = self.state.borrow_mut();
        state.slots.clear();
        state.settle(Err(err));
    }
}

impl<T> JoinWait<T> {
    /// Wait for every slot, or the first failure.
    pub async fn wait(self) -> StoreResult<Vec<T>> {
        self.receiver.await.map_err(|_| {
            StoreError::Request("join dropped before every slot completed".to_string())
        })?
    }
}
