//! Pay-per-view unlock gate.
//!
//! Content flagged as PPV stays locked until the viewer has watched
//! `required` ads. Each completed ad is reported to the backend, which stamps
//! an expiry once the threshold is met. An ad that fails to load degrades to a
//! placeholder countdown that still counts as a watched ad when it finishes.
//! After expiry the full sequence has to be watched again.

use serde::Serialize;

use crate::constants::ppv::FALLBACK_COUNTDOWN_SECS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateState {
    /// Not pay-per-view, or access comes from elsewhere.
    Open,
    Locked { watched: u32, required: u32 },
    WatchingAd { watched: u32, required: u32 },
    Fallback {
        watched: u32,
        required: u32,
        remaining_secs: u32,
    },
    Unlocked { expires_at: i64 },
    Expired { required: u32 },
}

/// Outcome of feeding an event into the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    None,
    /// An ad (real or placeholder) finished and must be recorded server-side.
    RecordAdWatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PpvGate {
    state: GateState,
}

impl PpvGate {
    /// Build the gate from persisted counters.
    ///
    /// `expires_at` of zero means "never unlocked".
    #[must_use]
    pub fn evaluate(watched: u32, required: u32, expires_at: i64, now: i64) -> Self {
        let state = if expires_at > now {
            GateState::Unlocked { expires_at }
        } else if expires_at > 0 {
            GateState::Expired { required }
        } else if required == 0 || watched >= required {
            // Threshold met but not yet stamped: the next recorded watch stamps it.
            GateState::Locked {
                watched: required,
                required,
            }
        } else {
            GateState::Locked { watched, required }
        };
        Self { state }
    }

    #[must_use]
    pub const fn open() -> Self {
        Self {
            state: GateState::Open,
        }
    }

    #[must_use]
    pub const fn state(&self) -> GateState {
        self.state
    }

    /// Locked until `watched >= required` has been confirmed with an expiry.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        !matches!(self.state, GateState::Open | GateState::Unlocked { .. })
    }

    /// Viewer pressed "watch ad".
    pub const fn start_ad(&mut self) {
        match self.state {
            GateState::Locked { watched, required } => {
                self.state = GateState::WatchingAd { watched, required };
            }
            GateState::Expired { required } => {
                self.state = GateState::WatchingAd {
                    watched: 0,
                    required,
                };
            }
            _ => {}
        }
    }

    /// The ad player reported completion.
    pub const fn ad_completed(&mut self) -> GateAction {
        match self.state {
            GateState::WatchingAd { watched, required } => {
                self.state = GateState::Locked {
                    watched: watched + 1,
                    required,
                };
                GateAction::RecordAdWatch
            }
            _ => GateAction::None,
        }
    }

    /// The ad failed to load; fall back to a countdown.
    pub const fn ad_failed(&mut self) {
        if let GateState::WatchingAd { watched, required } = self.state {
            self.state = GateState::Fallback {
                watched,
                required,
                remaining_secs: FALLBACK_COUNTDOWN_SECS,
            };
        }
    }

    /// Advance the fallback countdown.
    pub const fn tick(&mut self, elapsed_secs: u32) -> GateAction {
        if let GateState::Fallback {
            watched,
            required,
            remaining_secs,
        } = self.state
        {
            if elapsed_secs >= remaining_secs {
                self.state = GateState::Locked {
                    watched: watched + 1,
                    required,
                };
                return GateAction::RecordAdWatch;
            }
            self.state = GateState::Fallback {
                watched,
                required,
                remaining_secs: remaining_secs - elapsed_secs,
            };
        }
        GateAction::None
    }

    /// Apply the backend's answer to a recorded watch.
    pub fn apply_recorded(&mut self, ads_watched: u32, ads_required: u32, expires_at: Option<i64>) {
        self.state = match expires_at {
            Some(expires_at) if ads_watched >= ads_required => GateState::Unlocked { expires_at },
            _ => GateState::Locked {
                watched: ads_watched,
                required: ads_required,
            },
        };
    }

    /// Re-check an unlocked gate against the clock.
    pub fn refresh(&mut self, now: i64) {
        if let GateState::Unlocked { expires_at } = self.state
            && now >= expires_at
        {
            // The required count is unknown here; callers re-evaluate from the server.
            self.state = GateState::Expired { required: 0 };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locked_until_threshold() {
        let now = 1_000;
        for required in 1..=5_u32 {
            for watched in 0..required {
                let gate = PpvGate::evaluate(watched, required, 0, now);
                assert!(gate.is_locked(), "watched={watched} required={required}");
            }
            let unlocked = PpvGate::evaluate(required, required, now + 10, now);
            assert!(!unlocked.is_locked());
        }
    }

    #[test]
    fn test_full_sequence_with_fallback() {
        let mut gate = PpvGate::evaluate(0, 2, 0, 0);

        gate.start_ad();
        assert_eq!(gate.ad_completed(), GateAction::RecordAdWatch);
        gate.apply_recorded(1, 2, None);
        assert!(gate.is_locked());

        gate.start_ad();
        gate.ad_failed();
        assert_eq!(gate.tick(5), GateAction::None);
        assert!(matches!(
            gate.state(),
            GateState::Fallback { remaining_secs: 10, .. }
        ));
        assert_eq!(gate.tick(10), GateAction::RecordAdWatch);
        gate.apply_recorded(2, 2, Some(5_000));
        assert_eq!(gate.state(), GateState::Unlocked { expires_at: 5_000 });
        assert!(!gate.is_locked());
    }

    #[test]
    fn test_expiry_requires_full_sequence_again() {
        let mut gate = PpvGate::evaluate(3, 3, 5_000, 1_000);
        assert!(!gate.is_locked());

        gate.refresh(5_000);
        assert!(gate.is_locked());

        let expired = PpvGate::evaluate(3, 3, 5_000, 6_000);
        assert_eq!(expired.state(), GateState::Expired { required: 3 });

        let mut gate = expired;
        gate.start_ad();
        assert_eq!(
            gate.state(),
            GateState::WatchingAd {
                watched: 0,
                required: 3
            }
        );
    }

    #[test]
    fn test_completion_without_start_is_ignored() {
        let mut gate = PpvGate::evaluate(0, 1, 0, 0);
        assert_eq!(gate.ad_completed(), GateAction::None);
        assert_eq!(gate.tick(100), GateAction::None);
        assert!(gate.is_locked());
    }
}
