use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

pub const DEFAULT_CAPACITY: usize = 3;

#[derive(Debug)]
struct GateState {
    available: usize,
    waiters: VecDeque<oneshot::Sender<()>>,
}

impl GateState {
    /// Hands the slot to the oldest live waiter, or returns it to the pool.
    fn release_slot(&mut self) {
        while let Some(waiter) = self.waiters.pop_front() {
            if waiter.send(()).is_ok() {
                return;
            }
        }
        self.available += 1;
    }
}

/// Counting admission gate with FIFO hand-off.
///
/// A released slot goes straight to the longest-waiting caller instead of
/// back to the pool, so a fresh `acquire` can never overtake a queued one.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    capacity: usize,
    state: Arc<Mutex<GateState>>,
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ConcurrencyGate {
    /// Capacity is clamped to at least one slot.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            state: Arc::new(Mutex::new(GateState {
                available: capacity,
                waiters: VecDeque::new(),
            })),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        lock(&self.state).available
    }

    pub fn waiting(&self) -> usize {
        lock(&self.state)
            .waiters
            .iter()
            .filter(|w| !w.is_closed())
            .count()
    }

    /// Waits for a slot. The slot is held until the returned permit is dropped.
    pub async fn acquire(&self) -> GatePermit {
        let receiver = {
            let mut state = lock(&self.state);
            if state.available > 0 {
                state.available -= 1;
                return GatePermit::new(self.state.clone());
            }
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            rx
        };

        let mut pending = PendingAcquire {
            receiver: Some(receiver),
            state: self.state.clone(),
        };
        pending.wait().await;
        GatePermit::new(self.state.clone())
    }
}

/// A held slot. Dropping it releases the slot.
#[derive(Debug)]
#[must_use = "dropping the permit releases the slot immediately"]
pub struct GatePermit {
    state: Option<Arc<Mutex<GateState>>>,
}

impl GatePermit {
    fn new(state: Arc<Mutex<GateState>>) -> Self {
        Self { state: Some(state) }
    }

    /// Releases the slot now; equivalent to dropping the permit.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(state) = self.state.take() {
            lock(&state).release_slot();
        }
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.release_inner();
    }
}

/// Queued acquire. If the caller gives up after the slot was already handed
/// over, the slot is passed on to the next waiter.
struct PendingAcquire {
    receiver: Option<oneshot::Receiver<()>>,
    state: Arc<Mutex<GateState>>,
}

impl PendingAcquire {
    async fn wait(&mut self) {
        if let Some(receiver) = self.receiver.as_mut() {
            // The sender lives in the gate state we hold an Arc to, so it is
            // only ever consumed by `release_slot`.
            let _ = receiver.await;
        }
        self.receiver = None;
    }
}

impl Drop for PendingAcquire {
    fn drop(&mut self) {
        if let Some(mut receiver) = self.receiver.take() {
            receiver.close();
            if receiver.try_recv().is_ok() {
                lock(&self.state).release_slot();
            }
        }
    }
}

fn lock(state: &Mutex<GateState>) -> MutexGuard<'_, GateState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::ConcurrencyGate;

    #[tokio::test]
    async fn capacity_is_at_least_one() {
        let gate = ConcurrencyGate::new(0);
        assert_eq!(gate.capacity(), 1);
        let permit = gate.acquire().await;
        assert_eq!(gate.available(), 0);
        permit.release();
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn dropping_a_permit_frees_the_slot() {
        let gate = ConcurrencyGate::new(2);
        {
            let _a = gate.acquire().await;
            let _b = gate.acquire().await;
            assert_eq!(gate.available(), 0);
        }
        assert_eq!(gate.available(), 2);
    }
}
