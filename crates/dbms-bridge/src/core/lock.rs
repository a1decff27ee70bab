//! Lock-wait contract for locking reads.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How long a locking read may wait for rows locked by another consumer.
///
/// Negative means "skip rows that are locked", zero means "fail immediately
/// if locked" and a positive value waits that many seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockWait(i32);

/// Interpretation of a [`LockWait`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockWaitMode {
    SkipLocked,
    NoWait,
    Seconds(u32),
}

impl LockWait {
    /// Skip rows locked by others.
    pub const SKIP_LOCKED: LockWait = LockWait(-1);

    /// Fail immediately when a row is locked.
    pub const NO_WAIT: LockWait = LockWait(0);

    pub fn new(value: i32) -> Self {
        Self(value)
    }

    /// Wait up to `seconds` for the lock.
    pub fn seconds(seconds: u32) -> Self {
        Self(i32::try_from(seconds).unwrap_or(i32::MAX))
    }

    pub fn value(&self) -> i32 {
        self.0
    }

    pub fn mode(&self) -> LockWaitMode {
        match self.0 {
            v if v < 0 => LockWaitMode::SkipLocked,
            0 => LockWaitMode::NoWait,
            v => LockWaitMode::Seconds(v as u32),
        }
    }
}

impl Default for LockWait {
    fn default() -> Self {
        LockWait::SKIP_LOCKED
    }
}

impl From<i32> for LockWait {
    fn from(value: i32) -> Self {
        LockWait(value)
    }
}

impl fmt::Display for LockWaitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockWaitMode::SkipLocked => write!(f, "skip-locked reading"),
            LockWaitMode::NoWait => write!(f, "a no-wait lock"),
            LockWaitMode::Seconds(s) => write!(f, "a lock wait of {} seconds", s),
        }
    }
}
