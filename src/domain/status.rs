//! Unit status reported to the model

use std::fmt;

/// Workload status as shown by `juju status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    Active,
    Maintenance(String),
    Waiting(String),
    Blocked(String),
}

impl UnitStatus {
    /// Status name understood by `status-set`
    pub fn name(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Maintenance(_) => "maintenance",
            Self::Waiting(_) => "waiting",
            Self::Blocked(_) => "blocked",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Active => "",
            Self::Maintenance(msg) | Self::Waiting(msg) | Self::Blocked(msg) => msg,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message().is_empty() {
            write!(f, "{}", self.name())
        } else {
            write!(f, "{}: {}", self.name(), self.message())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(UnitStatus::Active.to_string(), "active");
        assert_eq!(
            UnitStatus::Blocked("Invalid external url: 'x'".to_string()).to_string(),
            "blocked: Invalid external url: 'x'"
        );
        assert_eq!(UnitStatus::Waiting("pod".to_string()).name(), "waiting");
    }
}
