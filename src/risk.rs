//! Risk tiers and the rules that combine them.
//!
//! Tiers form a strict total order `low < medium < high < critical`. Every
//! combination rule is `max`: a boost can raise a tier, never lower it.

use serde::{Deserialize, Serialize};

/// Unified risk tier used by every risk comparison in the crate.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    /// Boost: take the higher tier. Commutative and idempotent.
    pub fn boost(self, other: RiskLevel) -> RiskLevel {
        self.max(other)
    }

    /// Tier from how many files depend on a file.
    pub fn from_dependent_count(count: usize) -> RiskLevel {
        match count {
            0..=5 => RiskLevel::Low,
            6..=15 => RiskLevel::Medium,
            16..=30 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }

    /// File-local tier from violation counts: three errors make a file
    /// critical, one makes it high; it takes three violations of any
    /// severity to reach medium.
    pub fn from_violation_counts(total: usize, errors: usize) -> RiskLevel {
        if total == 0 {
            RiskLevel::Low
        } else if errors >= 3 {
            RiskLevel::Critical
        } else if errors >= 1 {
            RiskLevel::High
        } else if total >= 3 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Tier from the complexity of a file's dependents (strict thresholds:
    /// an average of exactly 15 is high, not critical).
    pub fn from_dependent_complexity(average: f64, max: f64) -> RiskLevel {
        if average > 15.0 || max > 25.0 {
            RiskLevel::Critical
        } else if average > 10.0 || max > 20.0 {
            RiskLevel::High
        } else if average > 6.0 || max > 15.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Dependency-based risk: the higher of the count signal and the
    /// dependent-complexity signal.
    pub fn from_dependency_signals(count: usize, complexity: Option<(f64, f64)>) -> RiskLevel {
        let count_tier = Self::from_dependent_count(count);
        match complexity {
            Some((average, max)) => count_tier.boost(Self::from_dependent_complexity(average, max)),
            None => count_tier,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
