//! `GetProfile(name)`: maps a profile tag to a duration and a
//! collector-inclusion rule.

use std::time::Duration;

use hostdiag_model::Profile;

/// Resolved duration + Phase 2 inclusion for a given profile.
#[derive(Debug, Clone, Copy)]
pub struct ProfilePlan {
    pub duration: Duration,
    pub run_phase2: bool,
}

/// Quick: tier-1 only, short duration. Standard: all collectors,
/// moderate duration. Deep: all collectors, longer duration (tool
/// registry's own per-tool minimums engage the sampling profilers).
pub fn resolve(profile: Profile) -> ProfilePlan {
    match profile {
        Profile::Quick => ProfilePlan { duration: Duration::from_secs(3), run_phase2: false },
        Profile::Standard => ProfilePlan { duration: Duration::from_secs(10), run_phase2: true },
        Profile::Deep => ProfilePlan { duration: Duration::from_secs(30), run_phase2: true },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quick_profile_skips_phase2() {
        assert!(!resolve(Profile::Quick).run_phase2);
    }

    #[test]
    fn deep_profile_runs_longer_than_standard() {
        assert!(resolve(Profile::Deep).duration > resolve(Profile::Standard).duration);
    }
}
