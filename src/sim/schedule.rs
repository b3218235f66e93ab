//! Delayed tasks on the fixed-step timeline
//!
//! Timed sequences (asteroid removal, ship respawn, invincibility blink, the
//! periodic spawn loop) are queued here instead of blocking the tick. A task
//! only carries handles; whoever runs it must re-check that its target still
//! exists and is in the expected state.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::entity::EntityId;
use crate::consts::SIM_DT;

/// Work that resumes after a delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Final removal of an asteroid pending destruction
    RemoveAsteroid(EntityId),
    /// Bring the ship back after its respawn delay
    RespawnShip,
    /// Toggle ship visibility while invincible; `life` is the respawn it belongs to
    BlinkShip { life: u32 },
    /// Invincibility window of respawn `life` is over
    EndInvincibility { life: u32 },
    /// Next iteration of the top-level spawn loop
    SpawnAsteroid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    due_tick: u64,
    seq: u64,
    task: Task,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap pops the earliest (due, seq) first
        other
            .due_tick
            .cmp(&self.due_tick)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of pending tasks keyed by due tick
#[derive(Debug, Default, Clone)]
pub struct Scheduler {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
}

/// Convert a delay in seconds to whole ticks (at least one)
pub fn delay_to_ticks(delay_secs: f32) -> u64 {
    let ticks = (delay_secs.max(0.0) / SIM_DT).round() as u64;
    ticks.max(1)
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to run `delay_secs` after `now_tick`
    pub fn schedule_after(&mut self, now_tick: u64, delay_secs: f32, task: Task) {
        self.schedule_at(now_tick + delay_to_ticks(delay_secs), task);
    }

    /// Queue `task` to run on `due_tick`
    pub fn schedule_at(&mut self, due_tick: u64, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry { due_tick, seq, task });
    }

    /// Pop the next task due at or before `now_tick`
    pub fn pop_due(&mut self, now_tick: u64) -> Option<Task> {
        if self.heap.peek()?.due_tick > now_tick {
            return None;
        }
        self.heap.pop().map(|entry| entry.task)
    }

    /// Number of pending tasks
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Whether any pending task matches
    pub fn contains(&self, task: Task) -> bool {
        self.heap.iter().any(|entry| entry.task == task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_to_ticks() {
        assert_eq!(delay_to_ticks(0.0), 1);
        assert_eq!(delay_to_ticks(1.0), 50);
        assert_eq!(delay_to_ticks(0.1), 5);
        assert_eq!(delay_to_ticks(-3.0), 1);
    }

    #[test]
    fn test_pops_in_due_order_then_fifo() {
        let mut s = Scheduler::new();
        s.schedule_at(10, Task::RespawnShip);
        s.schedule_at(5, Task::RemoveAsteroid(EntityId(1)));
        s.schedule_at(5, Task::RemoveAsteroid(EntityId(2)));
        s.schedule_at(7, Task::BlinkShip { life: 1 });

        assert_eq!(s.pop_due(4), None);
        assert_eq!(s.pop_due(5), Some(Task::RemoveAsteroid(EntityId(1))));
        assert_eq!(s.pop_due(5), Some(Task::RemoveAsteroid(EntityId(2))));
        assert_eq!(s.pop_due(5), None);
        assert_eq!(s.pop_due(20), Some(Task::BlinkShip { life: 1 }));
        assert_eq!(s.pop_due(20), Some(Task::RespawnShip));
        assert!(s.is_empty());
    }

    #[test]
    fn test_overlapping_tasks_coexist() {
        let mut s = Scheduler::new();
        for id in 0..5 {
            s.schedule_after(id, 1.0, Task::RemoveAsteroid(EntityId(id as u32)));
        }
        assert_eq!(s.len(), 5);
        assert!(s.contains(Task::RemoveAsteroid(EntityId(3))));
        assert_eq!(s.pop_due(50), Some(Task::RemoveAsteroid(EntityId(0))));
        assert_eq!(s.pop_due(50), None);
    }
}
