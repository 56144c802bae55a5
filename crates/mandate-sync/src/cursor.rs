//! The adaptive scan window as a pure state machine.
//!
//! A scan walks `cursor` upward through one pattern's identifier space and
//! stops after `max_misses` consecutive misses. [`ScanCursor::step`] has no
//! I/O, so the stopping rule is testable by feeding it probe outcomes.

use std::str::FromStr;

/// Outcome of probing one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Already in local storage.
    Local,
    /// Confirmed remotely (and downloaded).
    Found,
    /// Confirmed absent both locally and remotely.
    Missing,
}

/// How a local-presence hit affects the miss counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LocalHitPolicy {
    /// Any confirmed presence, local or remote, resets the window.
    #[default]
    Reset,
    /// Local hits advance the cursor but leave the counter untouched.
    Preserve,
}

impl FromStr for LocalHitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reset" => Ok(Self::Reset),
            "preserve" => Ok(Self::Preserve),
            other => Err(format!("unknown local hit policy {other:?} (expected reset|preserve)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanCursor {
    /// Next position to probe.
    pub cursor: i64,
    /// Consecutive misses immediately before `cursor`.
    pub misses: u32,
}

impl ScanCursor {
    /// Start right after the last confirmed position.
    pub fn after(highest_found: i64) -> Self {
        Self {
            cursor: highest_found + 1,
            misses: 0,
        }
    }

    /// Advance past the current position.
    pub fn step(self, probe: Probe, policy: LocalHitPolicy) -> Self {
        let misses = match (probe, policy) {
            (Probe::Found, _) | (Probe::Local, LocalHitPolicy::Reset) => 0,
            (Probe::Local, LocalHitPolicy::Preserve) => self.misses,
            (Probe::Missing, _) => self.misses + 1,
        };
        Self {
            cursor: self.cursor + 1,
            misses,
        }
    }

    pub fn is_exhausted(&self, max_misses: u32) -> bool {
        self.misses >= max_misses
    }

    /// Last certain position: back off past the trailing run of misses so the
    /// next run re-probes the gap.
    pub fn highest_found(&self) -> i64 {
        self.cursor - i64::from(self.misses) - 1
    }
}
