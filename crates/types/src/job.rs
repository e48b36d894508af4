//! Build job types and states.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a build job treats upstream dependencies of its targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    /// Build only the targets.
    #[default]
    NonRecursiveForcedBuild,
    /// Build the targets and any missing upstream dependencies.
    RecursiveBuild,
    /// Rebuild every upstream dependency and the targets.
    RecursiveForcedBuild,
    /// Build only missing upstream datasets.
    RecursiveMissingOnlyBuild,
}

impl JobType {
    pub const ALL: &'static [JobType] = &[
        JobType::NonRecursiveForcedBuild,
        JobType::RecursiveBuild,
        JobType::RecursiveForcedBuild,
        JobType::RecursiveMissingOnlyBuild,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NonRecursiveForcedBuild => "NON_RECURSIVE_FORCED_BUILD",
            Self::RecursiveBuild => "RECURSIVE_BUILD",
            Self::RecursiveForcedBuild => "RECURSIVE_FORCED_BUILD",
            Self::RecursiveMissingOnlyBuild => "RECURSIVE_MISSING_ONLY_BUILD",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid job_type '{0}'. Must be one of: NON_RECURSIVE_FORCED_BUILD, RECURSIVE_BUILD, RECURSIVE_FORCED_BUILD, RECURSIVE_MISSING_ONLY_BUILD")]
pub struct UnknownJobType(pub String);

impl FromStr for JobType {
    type Err = UnknownJobType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|job_type| job_type.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownJobType(value.to_string()))
    }
}

pub const UNKNOWN_JOB_STATE: &str = "UNKNOWN";

/// Job states after which the platform will not change the job any more.
pub fn is_terminal_job_state(state: &str) -> bool {
    matches!(state, "DONE" | "FAILED" | "ABORTED")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_job_types_case_insensitively() {
        assert_eq!("recursive_build".parse::<JobType>(), Ok(JobType::RecursiveBuild));
        assert_eq!(JobType::default().as_str(), "NON_RECURSIVE_FORCED_BUILD");
        assert!("FULL_REBUILD".parse::<JobType>().is_err());
    }

    #[test]
    fn recognises_terminal_states() {
        assert!(is_terminal_job_state("DONE"));
        assert!(is_terminal_job_state("FAILED"));
        assert!(!is_terminal_job_state("RUNNING"));
        assert!(!is_terminal_job_state(UNKNOWN_JOB_STATE));
    }
}
