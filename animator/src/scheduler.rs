use geom::{Duration, Time};

/// A single-threaded queue of delayed callbacks, running on virtual time. The owner moves time
/// forwards explicitly, so the same code runs from a UI frame loop or a deterministic test.
pub struct Scheduler<T> {
    now: Time,
    next_seq: usize,
    pending: Vec<Pending<T>>,
}

struct Pending<T> {
    due: Time,
    // Breaks ties between tasks due at the same time, so they run in the order posted
    seq: usize,
    task: T,
}

impl<T: PartialEq> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Time::START_OF_DAY,
            next_seq: 0,
            pending: Vec::new(),
        }
    }

    pub fn now(&self) -> Time {
        self.now
    }

    /// Runs the task as soon as the owner next advances time, even by zero.
    pub fn post(&mut self, task: T) {
        self.post_delayed(task, Duration::ZERO);
    }

    pub fn post_delayed(&mut self, task: T, delay: Duration) {
        let delay = if delay < Duration::ZERO {
            warn!("Can't schedule a task {delay} in the past; running it now instead");
            Duration::ZERO
        } else {
            delay
        };
        self.pending.push(Pending {
            due: self.now + delay,
            seq: self.next_seq,
            task,
        });
        self.next_seq += 1;
    }

    /// Cancels every pending copy of this task, returning how many were removed.
    pub fn remove_callbacks(&mut self, task: &T) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| p.task != *task);
        before - self.pending.len()
    }

    pub fn has_callbacks(&self, task: &T) -> bool {
        self.pending.iter().any(|p| p.task == *task)
    }

    pub fn num_pending(&self) -> usize {
        self.pending.len()
    }

    pub fn next_due(&self) -> Option<Time> {
        self.earliest().map(|idx| self.pending[idx].due)
    }

    /// Removes and returns the earliest task due at or before `until`, moving the clock to that
    /// task's due time.
    pub fn pop_due(&mut self, until: Time) -> Option<T> {
        let idx = self.earliest()?;
        if self.pending[idx].due > until {
            return None;
        }
        let pending = self.pending.remove(idx);
        if pending.due > self.now {
            self.now = pending.due;
        }
        Some(pending.task)
    }

    /// Moves the clock forwards without running anything. Time never goes backwards.
    pub fn advance_to(&mut self, time: Time) {
        if time < self.now {
            warn!(
                "Ignoring a clock jump backwards from {} to {}",
                self.now, time
            );
            return;
        }
        self.now = time;
    }

    fn earliest(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (idx, p) in self.pending.iter().enumerate() {
            match best {
                Some(b) => {
                    let current = &self.pending[b];
                    if p.due < current.due || (p.due == current.due && p.seq < current.seq) {
                        best = Some(idx);
                    }
                }
                None => {
                    best = Some(idx);
                }
            }
        }
        best
    }
}

impl<T: PartialEq> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
