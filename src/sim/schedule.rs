//! Delayed tasks keyed to the round epoch
//!
//! Every task remembers the epoch it was scheduled in. Ending or restarting a
//! round bumps the epoch, so anything still pending from the old round is
//! dropped when it comes due instead of acting on the new one.

/// Work the session defers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Task {
    /// Spawn the next held ball at `x`
    SpawnHeld { x: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Scheduled {
    due_ms: f64,
    epoch: u64,
    task: Task,
}

/// Pending tasks in due order
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    epoch: u64,
    pending: Vec<Scheduled>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to run `delay_ms` after `now_ms`
    pub fn schedule(&mut self, now_ms: f64, delay_ms: f64, task: Task) {
        let entry = Scheduled {
            due_ms: now_ms + delay_ms,
            epoch: self.epoch,
            task,
        };
        // Stable: equal due times keep insertion order
        let at = self
            .pending
            .iter()
            .position(|s| s.due_ms > entry.due_ms)
            .unwrap_or(self.pending.len());
        self.pending.insert(at, entry);
    }

    /// Invalidate everything scheduled so far
    pub fn advance_epoch(&mut self) {
        self.epoch += 1;
        let epoch = self.epoch;
        self.pending.retain(|s| s.epoch == epoch);
    }

    /// Remove and return tasks due at `now_ms` from the current epoch
    pub fn take_due(&mut self, now_ms: f64) -> Vec<Task> {
        let split = self
            .pending
            .iter()
            .position(|s| s.due_ms > now_ms)
            .unwrap_or(self.pending.len());
        let epoch = self.epoch;
        self.pending
            .drain(..split)
            .filter(|s| s.epoch == epoch)
            .map(|s| s.task)
            .collect()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
