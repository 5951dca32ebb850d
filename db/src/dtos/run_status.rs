use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(sqlx::Type, Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[sqlx(type_name = "run_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Success,
    Failed,
    Cancelled,
}

impl RunStatus {
    /// Terminal statuses always carry an `end_time`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Cancelled)
    }

    /// `pending` may move anywhere, `running` only to a terminal status, and
    /// terminal statuses never change.
    pub fn can_become(self, next: RunStatus) -> bool {
        match self {
            Self::Pending => true,
            Self::Running => next.is_terminal(),
            Self::Success | Self::Failed | Self::Cancelled => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_finished_statuses_are_terminal() {
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Success.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Cancelled.is_terminal());
    }

    #[test]
    fn finished_runs_never_change_status() {
        for finished in [RunStatus::Success, RunStatus::Failed, RunStatus::Cancelled] {
            assert!(!finished.can_become(RunStatus::Running));
            assert!(!finished.can_become(RunStatus::Success));
            assert!(!finished.can_become(RunStatus::Cancelled));
        }

        assert!(RunStatus::Pending.can_become(RunStatus::Running));
        assert!(RunStatus::Pending.can_become(RunStatus::Cancelled));
        assert!(RunStatus::Running.can_become(RunStatus::Failed));
        assert!(!RunStatus::Running.can_become(RunStatus::Running));
        assert!(!RunStatus::Running.can_become(RunStatus::Pending));
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&RunStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
        assert_eq!(RunStatus::Success.to_string(), "success");
    }
}
