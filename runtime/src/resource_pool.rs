//! Bounded pool of interchangeable workers with FIFO hand-over.
//!
//! A [`ResourcePool`] owns no tasks and never blocks. It only keeps score:
//! how many slots are held, and which requests are waiting in arrival order.
//! When a slot is released while requests wait, it goes straight to the
//! longest waiter without ever becoming free, so a newly arriving request can
//! not overtake one that is already queued.

use std::collections::VecDeque;
use thiserror::Error;

/// Errors from [`ResourcePool`] operations
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// A pool needs at least one slot
    #[error("Resource pool capacity must be at least 1")]
    ZeroCapacity,

    /// `release` was called with no slot held
    #[error("Released a slot while none were held")]
    NothingToRelease,
}

/// Outcome of [`ResourcePool::acquire`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquire<T> {
    /// A slot was free; the caller holds it now
    Granted(T),
    /// No slot was free; the request waits at `position` (0 is next in line)
    Queued {
        /// Place in the waiting line at the time of the request
        position: usize,
    },
}

/// Bounded pool of `capacity` identical slots.
///
/// `T` is the request: whatever the caller needs back when its turn comes.
#[derive(Debug, Clone)]
pub struct ResourcePool<T> {
    capacity: usize,
    in_use: usize,
    peak_in_use: usize,
    waiting: VecDeque<T>,
}

impl<T> ResourcePool<T> {
    /// Create a pool with `capacity` free slots.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::ZeroCapacity`] if `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self, PoolError> {
        if capacity == 0 {
            return Err(PoolError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            in_use: 0,
            peak_in_use: 0,
            waiting: VecDeque::new(),
        })
    }

    /// Request a slot.
    ///
    /// Grants immediately when a slot is free, otherwise appends the request
    /// to the back of the waiting line.
    pub fn acquire(&mut self, request: T) -> Acquire<T> {
        if self.in_use < self.capacity {
            self.in_use += 1;
            self.peak_in_use = self.peak_in_use.max(self.in_use);
            Acquire::Granted(request)
        } else {
            self.waiting.push_back(request);
            Acquire::Queued {
                position: self.waiting.len() - 1,
            }
        }
    }

    /// Give a slot back.
    ///
    /// If requests are waiting, the slot passes directly to the one at the
    /// front, which is returned; the number of held slots does not change.
    /// Otherwise the slot becomes free and `None` is returned.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NothingToRelease`] if no slot is held.
    pub fn release(&mut self) -> Result<Option<T>, PoolError> {
        if self.in_use == 0 {
            return Err(PoolError::NothingToRelease);
        }
        match self.waiting.pop_front() {
            Some(next) => Ok(Some(next)),
            None => {
                self.in_use -= 1;
                Ok(None)
            },
        }
    }

    /// Total number of slots
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held
    #[must_use]
    pub const fn in_use(&self) -> usize {
        self.in_use
    }

    /// Slots currently free
    #[must_use]
    pub const fn available(&self) -> usize {
        self.capacity - self.in_use
    }

    /// Requests waiting for a slot
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.waiting.len()
    }

    /// Highest number of slots held at once since creation
    #[must_use]
    pub const fn peak_in_use(&self) -> usize {
        self.peak_in_use
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(ResourcePool::<u32>::new(0).err(), Some(PoolError::ZeroCapacity));
    }

    #[test]
    fn grants_until_full_then_queues() {
        let mut pool = ResourcePool::new(2).unwrap();
        assert_eq!(pool.acquire('a'), Acquire::Granted('a'));
        assert_eq!(pool.acquire('b'), Acquire::Granted('b'));
        assert_eq!(pool.acquire('c'), Acquire::Queued { position: 0 });
        assert_eq!(pool.acquire('d'), Acquire::Queued { position: 1 });
        assert_eq!(pool.in_use(), 2);
        assert_eq!(pool.available(), 0);
        assert_eq!(pool.waiting(), 2);
    }

    #[test]
    fn release_hands_slot_to_longest_waiter() {
        let mut pool = ResourcePool::new(1).unwrap();
        pool.acquire(1);
        pool.acquire(2);
        pool.acquire(3);

        assert_eq!(pool.release(), Ok(Some(2)));
        assert_eq!(pool.in_use(), 1);
        assert_eq!(pool.release(), Ok(Some(3)));
        assert_eq!(pool.release(), Ok(None));
        assert_eq!(pool.in_use(), 0);
        assert_eq!(pool.release(), Err(PoolError::NothingToRelease));
    }

    #[test]
    fn newcomer_cannot_overtake_a_waiter() {
        let mut pool = ResourcePool::new(1).unwrap();
        pool.acquire("first");
        pool.acquire("waiting");
        // the released slot never becomes free, so a new request still queues
        assert_eq!(pool.release(), Ok(Some("waiting")));
        assert_eq!(pool.acquire("late"), Acquire::Queued { position: 0 });
    }

    #[test]
    fn peak_tracks_highest_concurrency() {
        let mut pool = ResourcePool::new(3).unwrap();
        pool.acquire(());
        pool.acquire(());
        pool.release().unwrap();
        pool.acquire(());
        assert_eq!(pool.peak_in_use(), 2);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Acquire,
        Release,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![Just(Op::Acquire), Just(Op::Release)]
    }

    proptest! {
        #[test]
        fn never_exceeds_capacity_and_serves_in_order(
            capacity in 1usize..5,
            ops in prop::collection::vec(op(), 0..200),
        ) {
            let mut pool = ResourcePool::new(capacity).unwrap();
            let mut next_request = 0u32;
            let mut served = Vec::new();
            let mut queued = Vec::new();

            for op in ops {
                match op {
                    Op::Acquire => {
                        match pool.acquire(next_request) {
                            Acquire::Granted(_) => {},
                            Acquire::Queued { .. } => queued.push(next_request),
                        }
                        next_request += 1;
                    }
                    Op::Release => {
                        if let Ok(Some(handed)) = pool.release() {
                            served.push(handed);
                        }
                    }
                }
                prop_assert!(pool.in_use() <= pool.capacity());
                prop_assert!(pool.waiting() == 0 || pool.available() == 0);
            }

            prop_assert_eq!(&served[..], &queued[..served.len()]);
        }
    }
}
