//! Scheduler
//!
//! Implements round-robin scheduling

use super::manager::ProcessTable;
use super::Pid;
use crate::config::TIME_SLICE;

pub struct Scheduler {
    time_slice: usize,
    current_time_slice: usize,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_time_slice(TIME_SLICE)
    }

    pub fn with_time_slice(time_slice: usize) -> Self {
        Self {
            time_slice,
            current_time_slice: 0,
        }
    }

    pub fn schedule_next(&mut self, current: Pid, table: &ProcessTable) -> Option<Pid> {
        // Round-robin: find next ready process
        let next = table.find_next_ready(current);
        if next.is_some() {
            self.reset_time_slice();
        }
        next
    }

    /// Counts one timer tick; true once the slice is used up.
    pub fn tick(&mut self) -> bool {
        self.current_time_slice += 1;
        if self.current_time_slice >= self.time_slice {
            self.current_time_slice = 0;
            true
        } else {
            false
        }
    }

    pub fn reset_time_slice(&mut self) {
        self.current_time_slice = 0;
    }
}
