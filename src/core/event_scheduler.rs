use super::types::{ProcessId, SimTime};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A pending resumption of one process
#[derive(Debug, Clone, Copy)]
pub struct ScheduledWakeup {
    pub at: SimTime,
    pub sequence_num: u64,
    pub process: ProcessId,
}

impl PartialEq for ScheduledWakeup {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledWakeup {}

impl PartialOrd for ScheduledWakeup {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledWakeup {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .at
            .total_cmp(&self.at)
            .then_with(|| other.sequence_num.cmp(&self.sequence_num))
    }
}

/// Simulated clock plus the set of pending timed resumptions.
///
/// Wake-ups at the same instant come out in registration order.
pub struct EventScheduler {
    wakeups: BinaryHeap<ScheduledWakeup>,
    sequence_counter: u64,
    now: SimTime,
}

impl EventScheduler {
    /// Create a new EventScheduler at time zero
    pub fn new() -> Self {
        Self {
            wakeups: BinaryHeap::new(),
            sequence_counter: 0,
            now: 0.0,
        }
    }

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Schedule `process` to resume at absolute time `at`
    pub fn schedule(&mut self, process: ProcessId, at: SimTime) {
        debug_assert!(at >= self.now, "wake-up at {} lies before now {}", at, self.now);
        self.wakeups.push(ScheduledWakeup {
            at: at.max(self.now),
            sequence_num: self.sequence_counter,
            process,
        });
        self.sequence_counter += 1;
    }

    /// Schedule `process` to resume after `delay`
    pub fn schedule_in(&mut self, process: ProcessId, delay: SimTime) {
        self.schedule(process, self.now + delay);
    }

    /// Move the clock to the earliest pending instant and take every
    /// wake-up registered for it, in registration order
    pub fn pop_next_instant(&mut self) -> Option<(SimTime, Vec<ProcessId>)> {
        let at = self.peek_next_time()?;
        self.now = at;

        let mut processes = Vec::new();
        while let Some(next) = self.wakeups.peek() {
            if next.at != at {
                break;
            }
            if let Some(wakeup) = self.wakeups.pop() {
                processes.push(wakeup.process);
            }
        }
        Some((at, processes))
    }

    /// Check if there are any wake-ups remaining
    pub fn has_pending(&self) -> bool {
        !self.wakeups.is_empty()
    }

    /// Number of pending wake-ups
    pub fn pending(&self) -> usize {
        self.wakeups.len()
    }

    /// Get the next wake-up time without removing anything
    pub fn peek_next_time(&self) -> Option<SimTime> {
        self.wakeups.peek().map(|wakeup| wakeup.at)
    }

    /// Move the clock forward without resuming anything
    ///
    /// Used to stop at a horizon; the clock never moves backwards.
    pub fn advance_to(&mut self, time: SimTime) {
        if time > self.now {
            self.now = time;
        }
    }
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{InspectorId, WorkstationId};

    fn ws(i: usize) -> ProcessId {
        ProcessId::Workstation(WorkstationId(i))
    }

    #[test]
    fn test_earliest_instant_first() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(ws(0), 5.0);
        scheduler.schedule(ws(1), 2.5);

        let (at, processes) = scheduler.pop_next_instant().unwrap();
        assert_eq!(at, 2.5);
        assert_eq!(processes, vec![ws(1)]);
        assert_eq!(scheduler.now(), 2.5);
    }

    #[test]
    fn test_same_instant_resolves_in_registration_order() {
        let mut scheduler = EventScheduler::new();
        let insp = ProcessId::Inspector(InspectorId(0));
        scheduler.schedule(insp, 1.0);
        scheduler.schedule(ws(2), 1.0);
        scheduler.schedule(ws(0), 1.0);
        scheduler.schedule(ws(1), 3.0);

        let (_, processes) = scheduler.pop_next_instant().unwrap();
        assert_eq!(processes, vec![insp, ws(2), ws(0)]);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_schedule_in_is_relative_to_now() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(ws(0), 4.0);
        scheduler.pop_next_instant();
        scheduler.schedule_in(ws(0), 1.5);
        assert_eq!(scheduler.peek_next_time(), Some(5.5));
    }

    #[test]
    fn test_advance_to_never_moves_backwards() {
        let mut scheduler = EventScheduler::new();
        scheduler.advance_to(10.0);
        scheduler.advance_to(3.0);
        assert_eq!(scheduler.now(), 10.0);
        assert!(scheduler.pop_next_instant().is_none());
    }
}
