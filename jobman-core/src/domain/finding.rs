//! Finding and severity types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Severity of a finding
///
/// Variants are declared from most to least severe, so the derived ordering
/// puts `Cosmic` first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Cosmic,
    Critical,
    High,
    #[default]
    Medium,
    Low,
    Info,
    None,
}

impl Severity {
    pub const ALL: [Severity; 7] = [
        Severity::Cosmic,
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
        Severity::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Cosmic => "cosmic",
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
            Severity::None => "none",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Severity::ALL
            .into_iter()
            .find(|severity| severity.as_str() == lower)
            .ok_or_else(|| {
                let names: Vec<&str> = Severity::ALL.iter().map(Severity::as_str).collect();
                format!("unknown severity '{}', expected one of: {}", s, names.join(", "))
            })
    }
}

/// A single finding reported by a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub title: String,
    pub severity: Severity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical < Severity::Medium);
        assert!(Severity::Medium < Severity::Low);
        assert!(Severity::Cosmic < Severity::None);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("HIGH".parse::<Severity>(), Ok(Severity::High));
        assert!("severe".parse::<Severity>().is_err());
        assert_eq!(Severity::default(), Severity::Medium);
    }
}
