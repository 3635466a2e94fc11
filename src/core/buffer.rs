use std::collections::{BTreeMap, VecDeque};

use super::types::{BufferKey, ProcessId};

/// Result of a blocking buffer operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferOutcome {
    /// The operation completed. `woken` is a waiter on the other side whose
    /// own operation completed as part of this one and must be resumed.
    Ready { woken: Option<ProcessId> },
    /// The caller is parked until a matching operation frees it
    Suspended,
}

/// Capacity-limited holding area for one component at one workstation.
///
/// A parked waiter's operation is applied at the moment it is released,
/// so nobody ever observes the level outside `[0, capacity]`.
#[derive(Debug, Clone)]
pub struct BoundedBuffer {
    capacity: u32,
    level: u32,
    get_waiters: VecDeque<ProcessId>,
    put_waiters: VecDeque<ProcessId>,
    total_puts: u64,
    total_gets: u64,
}

impl BoundedBuffer {
    /// Create an empty buffer with the given capacity
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            level: 0,
            get_waiters: VecDeque::new(),
            put_waiters: VecDeque::new(),
            total_puts: 0,
            total_gets: 0,
        }
    }

    /// Take one unit, parking `process` if the buffer is empty
    pub fn get(&mut self, process: ProcessId) -> BufferOutcome {
        let outcome = if self.level > 0 {
            self.level -= 1;
            self.total_gets += 1;
            // The freed slot goes to the oldest blocked producer
            let woken = self.put_waiters.pop_front().map(|putter| {
                self.level += 1;
                self.total_puts += 1;
                putter
            });
            BufferOutcome::Ready { woken }
        } else if let Some(putter) = self.put_waiters.pop_front() {
            // Only reachable with zero capacity: hand the unit over directly
            self.total_puts += 1;
            self.total_gets += 1;
            BufferOutcome::Ready {
                woken: Some(putter),
            }
        } else {
            self.get_waiters.push_back(process);
            BufferOutcome::Suspended
        };
        self.check_invariant();
        outcome
    }

    /// Store one unit, parking `process` if the buffer is full
    pub fn put(&mut self, process: ProcessId) -> BufferOutcome {
        let outcome = if self.level < self.capacity {
            self.level += 1;
            self.total_puts += 1;
            // The new unit goes to the oldest blocked consumer
            let woken = self.get_waiters.pop_front().map(|getter| {
                self.level -= 1;
                self.total_gets += 1;
                getter
            });
            BufferOutcome::Ready { woken }
        } else if let Some(getter) = self.get_waiters.pop_front() {
            self.total_puts += 1;
            self.total_gets += 1;
            BufferOutcome::Ready {
                woken: Some(getter),
            }
        } else {
            self.put_waiters.push_back(process);
            BufferOutcome::Suspended
        };
        self.check_invariant();
        outcome
    }

    fn check_invariant(&self) {
        assert!(
            self.level <= self.capacity,
            "buffer level {} exceeds capacity {}",
            self.level,
            self.capacity
        );
        debug_assert!(
            self.get_waiters.is_empty() || self.level == 0,
            "consumers parked on a non-empty buffer"
        );
        debug_assert!(
            self.put_waiters.is_empty() || self.level == self.capacity,
            "producers parked on a buffer with free space"
        );
    }

    /// Units currently resting in the buffer
    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.level >= self.capacity
    }

    /// Completed `put`s over the whole run
    pub fn total_puts(&self) -> u64 {
        self.total_puts
    }

    /// Completed `get`s over the whole run
    pub fn total_gets(&self) -> u64 {
        self.total_gets
    }

    /// Processes parked waiting for a unit
    pub fn waiting_consumers(&self) -> usize {
        self.get_waiters.len()
    }

    /// Processes parked waiting for a free slot
    pub fn waiting_producers(&self) -> usize {
        self.put_waiters.len()
    }
}

/// All buffers of a line, keyed by (workstation, component)
#[derive(Debug, Clone, Default)]
pub struct BufferRegistry {
    buffers: BTreeMap<BufferKey, BoundedBuffer>,
}

impl BufferRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the buffer for `key` if it does not exist yet
    pub fn insert(&mut self, key: BufferKey, capacity: u32) {
        self.buffers
            .entry(key)
            .or_insert_with(|| BoundedBuffer::new(capacity));
    }

    pub fn get(&self, key: &BufferKey) -> Option<&BoundedBuffer> {
        self.buffers.get(key)
    }

    pub fn get_mut(&mut self, key: &BufferKey) -> Option<&mut BoundedBuffer> {
        self.buffers.get_mut(key)
    }

    /// Current level of the buffer for `key`, if the workstation has one
    pub fn level(&self, key: &BufferKey) -> Option<u32> {
        self.buffers.get(key).map(BoundedBuffer::level)
    }

    /// Iterate buffers in key order
    pub fn iter(&self) -> impl Iterator<Item = (&BufferKey, &BoundedBuffer)> {
        self.buffers.iter()
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{InspectorId, WorkstationId};

    fn consumer(i: usize) -> ProcessId {
        ProcessId::Workstation(WorkstationId(i))
    }

    fn producer(i: usize) -> ProcessId {
        ProcessId::Inspector(InspectorId(i))
    }

    #[test]
    fn test_put_and_get_without_blocking() {
        let mut buffer = BoundedBuffer::new(2);
        assert_eq!(buffer.put(producer(0)), BufferOutcome::Ready { woken: None });
        assert_eq!(buffer.put(producer(0)), BufferOutcome::Ready { woken: None });
        assert!(buffer.is_full());
        assert_eq!(buffer.get(consumer(0)), BufferOutcome::Ready { woken: None });
        assert_eq!(buffer.level(), 1);
    }

    #[test]
    fn test_get_on_empty_buffer_suspends_until_put() {
        let mut buffer = BoundedBuffer::new(2);
        assert_eq!(buffer.get(consumer(0)), BufferOutcome::Suspended);
        assert_eq!(buffer.waiting_consumers(), 1);

        // The put completes and hands the unit to the parked consumer
        assert_eq!(
            buffer.put(producer(0)),
            BufferOutcome::Ready {
                woken: Some(consumer(0))
            }
        );
        assert_eq!(buffer.level(), 0);
        assert_eq!(buffer.total_puts(), 1);
        assert_eq!(buffer.total_gets(), 1);
    }

    #[test]
    fn test_put_on_full_buffer_suspends_until_get() {
        let mut buffer = BoundedBuffer::new(2);
        buffer.put(producer(0));
        buffer.put(producer(0));
        assert_eq!(buffer.put(producer(1)), BufferOutcome::Suspended);
        assert_eq!(buffer.level(), 2);

        assert_eq!(
            buffer.get(consumer(0)),
            BufferOutcome::Ready {
                woken: Some(producer(1))
            }
        );
        assert_eq!(buffer.level(), 2);
        assert_eq!(buffer.waiting_producers(), 0);
    }

    #[test]
    fn test_waiters_are_served_in_arrival_order() {
        let mut buffer = BoundedBuffer::new(2);
        buffer.get(consumer(0));
        buffer.get(consumer(1));
        buffer.get(consumer(2));

        let mut served = Vec::new();
        for _ in 0..3 {
            if let BufferOutcome::Ready { woken: Some(p) } = buffer.put(producer(0)) {
                served.push(p);
            }
        }
        assert_eq!(served, vec![consumer(0), consumer(1), consumer(2)]);
    }

    #[test]
    fn test_parked_producers_are_released_in_arrival_order() {
        let mut buffer = BoundedBuffer::new(2);
        buffer.put(producer(0));
        buffer.put(producer(0));
        assert_eq!(buffer.put(producer(1)), BufferOutcome::Suspended);
        assert_eq!(buffer.put(producer(2)), BufferOutcome::Suspended);
        assert_eq!(buffer.waiting_producers(), 2);

        let mut served = Vec::new();
        for _ in 0..2 {
            if let BufferOutcome::Ready { woken: Some(p) } = buffer.get(consumer(0)) {
                served.push(p);
            }
            // Each freed slot is refilled by the released producer
            assert_eq!(buffer.level(), 2);
        }
        assert_eq!(served, vec![producer(1), producer(2)]);
        assert_eq!(buffer.waiting_producers(), 0);
        assert_eq!(buffer.total_puts(), 4);
        assert_eq!(buffer.total_gets(), 2);
    }

    #[test]
    fn test_zero_capacity_buffer_hands_over_directly() {
        let mut buffer = BoundedBuffer::new(0);
        assert_eq!(buffer.put(producer(0)), BufferOutcome::Suspended);
        assert_eq!(
            buffer.get(consumer(0)),
            BufferOutcome::Ready {
                woken: Some(producer(0))
            }
        );
        assert_eq!(buffer.level(), 0);

        assert_eq!(buffer.get(consumer(1)), BufferOutcome::Suspended);
        assert_eq!(
            buffer.put(producer(1)),
            BufferOutcome::Ready {
                woken: Some(consumer(1))
            }
        );
    }

    #[test]
    fn test_registry_levels() {
        let mut registry = BufferRegistry::new();
        let key = BufferKey::new(WorkstationId(0), crate::core::types::ComponentId(1));
        registry.insert(key, 2);
        registry.get_mut(&key).unwrap().put(producer(0));
        assert_eq!(registry.level(&key), Some(1));
        assert_eq!(
            registry.level(&BufferKey::new(WorkstationId(1), crate::core::types::ComponentId(1))),
            None
        );
    }
}
