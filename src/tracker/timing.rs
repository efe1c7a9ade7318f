/*!
 * Record Timing
 * Start/stop state machine shared by events and activities
 *
 * States: Created -> Running -> Stopped, with Stopped terminal. Lifecycle
 * misuse (double start, stop before start, double stop) returns a usage
 * error and leaves the recorded timing untouched.
 */

use crate::core::errors::{UsageError, UsageResult};
use crate::core::types::{now_usec, Usec, UsecTimestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Created,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timing {
    state: RunState,
    start_usec: UsecTimestamp,
    stop_usec: UsecTimestamp,
    wait_usec: Usec,
    elapsed_usec: Usec,
}

impl Timing {
    pub fn new() -> Self {
        Self {
            state: RunState::Created,
            start_usec: 0,
            stop_usec: 0,
            wait_usec: 0,
            elapsed_usec: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn start(&mut self) -> UsageResult<()> {
        self.start_at(now_usec())
    }

    pub fn start_at(&mut self, timestamp: UsecTimestamp) -> UsageResult<()> {
        match self.state {
            RunState::Created => {
                self.start_usec = timestamp;
                self.state = RunState::Running;
                Ok(())
            }
            RunState::Running => Err(UsageError::AlreadyStarted),
            RunState::Stopped => Err(UsageError::AlreadyStopped),
        }
    }

    pub fn stop(&mut self) -> UsageResult<()> {
        self.stop_at(now_usec())
    }

    pub fn stop_at(&mut self, timestamp: UsecTimestamp) -> UsageResult<()> {
        match self.state {
            RunState::Created => Err(UsageError::NotStarted),
            RunState::Running => {
                self.stop_usec = timestamp.max(self.start_usec);
                self.elapsed_usec = (self.stop_usec - self.start_usec).saturating_sub(self.wait_usec);
                self.state = RunState::Stopped;
                Ok(())
            }
            RunState::Stopped => Err(UsageError::AlreadyStopped),
        }
    }

    /// Convenience path for work timed by the caller: backdates the start
    /// instant to `now - elapsed` and stops immediately.
    pub fn stop_backdated(&mut self, elapsed: Usec) -> UsageResult<()> {
        match self.state {
            RunState::Created => {
                let now = now_usec();
                self.start_usec = now.saturating_sub(elapsed);
                self.stop_usec = now;
                self.elapsed_usec = elapsed.saturating_sub(self.wait_usec);
                self.state = RunState::Stopped;
                Ok(())
            }
            RunState::Running => Err(UsageError::AlreadyStarted),
            RunState::Stopped => Err(UsageError::AlreadyStopped),
        }
    }

    /// Record caller-observed wait time (queue/lock wait). Rejected once
    /// the record has stopped; recorded wait is subtracted from elapsed.
    pub fn add_wait(&mut self, wait: Usec) -> UsageResult<()> {
        if self.state == RunState::Stopped {
            return Err(UsageError::AlreadyStopped);
        }
        self.wait_usec = self.wait_usec.saturating_add(wait);
        Ok(())
    }

    #[inline]
    pub fn start_usec(&self) -> UsecTimestamp {
        self.start_usec
    }

    #[inline]
    pub fn stop_usec(&self) -> UsecTimestamp {
        self.stop_usec
    }

    #[inline]
    pub fn wait_usec(&self) -> Usec {
        self.wait_usec
    }

    /// Elapsed time: (stop - start) minus recorded wait. Zero until stopped.
    #[inline]
    pub fn elapsed_usec(&self) -> Usec {
        self.elapsed_usec
    }

    /// Full start-to-stop window, wait included. Zero until stopped.
    #[inline]
    pub fn wall_usec(&self) -> Usec {
        self.stop_usec.saturating_sub(self.start_usec)
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::new()
    }
}
