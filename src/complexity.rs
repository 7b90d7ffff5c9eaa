//! Complexity violation detection.
//!
//! Each function/method fragment is checked against fixed baselines per
//! metric. A metric crosses into `warning` at the baseline and into `error`
//! at double the baseline; the threshold recorded on a violation is the tier
//! it actually crossed. Metrics are independent: one fragment can produce up
//! to four violations in a single pass.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::schema::{CodeFragment, FragmentKind, HalsteadMetrics};

// ========== Thresholds ==========

/// Cyclomatic complexity baseline (independent test paths).
pub const CYCLOMATIC_BASELINE: f64 = 15.0;
/// Cognitive complexity baseline (mental load).
pub const COGNITIVE_BASELINE: f64 = 15.0;
/// Halstead effort baseline, in minutes of understanding time.
pub const EFFORT_BASELINE_MINUTES: f64 = 60.0;
/// Halstead estimated-bugs baseline.
pub const BUGS_BASELINE: f64 = 1.5;
/// Violations escalate from warning to error at this multiple of baseline.
pub const ERROR_MULTIPLIER: f64 = 2.0;
/// Raw Halstead effort per minute of understanding time (18 seconds per
/// elementary discrimination, 60 discriminations of effort per unit minute).
pub const EFFORT_PER_MINUTE: f64 = 1080.0;

// ========== Violation Types ==========

/// Which metric crossed a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Cyclomatic,
    Cognitive,
    HalsteadEffort,
    HalsteadBugs,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Cyclomatic => "cyclomatic",
            MetricKind::Cognitive => "cognitive",
            MetricKind::HalsteadEffort => "halstead_effort",
            MetricKind::HalsteadBugs => "halstead_bugs",
        }
    }
}

/// Violation severity band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// One metric/symbol pair that crossed a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub file_path: String,
    pub symbol: String,
    pub kind: FragmentKind,
    /// Line range in display form ("12-48").
    pub lines: String,
    pub metric: MetricKind,
    /// Human-scaled value: minutes for effort, decimal for bugs, otherwise
    /// the integer count.
    pub value: f64,
    /// The threshold of whichever band was crossed.
    pub threshold: f64,
    pub severity: Severity,
    pub message: String,
    /// Full Halstead numbers, attached to Halstead-derived violations only.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub halstead: Option<HalsteadMetrics>,
}

/// Result of one violation pass over a fragment set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationScan {
    pub violations: Vec<Violation>,
    /// Function/method fragments checked after deduplication.
    pub functions_checked: usize,
    pub average_cyclomatic: f64,
    pub max_cyclomatic: f64,
}

// ========== Detection ==========

/// Band check: `None` below baseline, warning from baseline, error from
/// double baseline. Returns the effective threshold alongside the severity.
fn crossed_band(value: f64, baseline: f64) -> Option<(Severity, f64)> {
    let error_at = baseline * ERROR_MULTIPLIER;
    if value >= error_at {
        Some((Severity::Error, error_at))
    } else if value >= baseline {
        Some((Severity::Warning, baseline))
    } else {
        None
    }
}

/// Check every available metric on one fragment. Non-callable kinds and
/// fragments without complexity numbers produce nothing.
pub fn check_fragment(fragment: &CodeFragment) -> Vec<Violation> {
    let mut out = Vec::new();
    if !fragment.kind.is_callable() {
        return out;
    }
    let Some(numbers) = fragment.complexity else {
        return out;
    };
    let symbol = fragment.symbol.as_deref().unwrap_or("(anonymous)");

    if let Some(cyclomatic) = numbers.cyclomatic {
        let value = f64::from(cyclomatic);
        if let Some((severity, threshold)) = crossed_band(value, CYCLOMATIC_BASELINE) {
            out.push(make_violation(
                fragment,
                symbol,
                MetricKind::Cyclomatic,
                value,
                threshold,
                severity,
                format!("needs {} test paths to cover", cyclomatic),
                None,
            ));
        }
    }

    if let Some(cognitive) = numbers.cognitive {
        let value = f64::from(cognitive);
        if let Some((severity, threshold)) = crossed_band(value, COGNITIVE_BASELINE) {
            out.push(make_violation(
                fragment,
                symbol,
                MetricKind::Cognitive,
                value,
                threshold,
                severity,
                format!("mental load of {} to follow", cognitive),
                None,
            ));
        }
    }

    if let Some(halstead) = numbers.halstead {
        let minutes = halstead.effort / EFFORT_PER_MINUTE;
        if let Some((severity, threshold)) = crossed_band(minutes, EFFORT_BASELINE_MINUTES) {
            out.push(make_violation(
                fragment,
                symbol,
                MetricKind::HalsteadEffort,
                minutes,
                threshold,
                severity,
                format!("takes ~{} to understand", format_effort_minutes(minutes)),
                Some(halstead),
            ));
        }
        if let Some((severity, threshold)) = crossed_band(halstead.bugs, BUGS_BASELINE) {
            out.push(make_violation(
                fragment,
                symbol,
                MetricKind::HalsteadBugs,
                halstead.bugs,
                threshold,
                severity,
                format!("an estimated {:.2} latent bugs", halstead.bugs),
                Some(halstead),
            ));
        }
    }

    out
}

#[allow(clippy::too_many_arguments)]
fn make_violation(
    fragment: &CodeFragment,
    symbol: &str,
    metric: MetricKind,
    value: f64,
    threshold: f64,
    severity: Severity,
    detail: String,
    halstead: Option<HalsteadMetrics>,
) -> Violation {
    Violation {
        file_path: fragment.file_path.clone(),
        symbol: symbol.to_string(),
        kind: fragment.kind,
        lines: fragment.line_range(),
        metric,
        value,
        threshold,
        severity,
        message: format!(
            "{}: {} ({} threshold: {})",
            symbol,
            detail,
            severity.as_str(),
            threshold
        ),
        halstead,
    }
}

/// Run the violation pass over a fragment collection. Fragments are
/// deduplicated by their repo+file+line-range key first so index duplicates
/// cannot double-report; cyclomatic stats cover every deduplicated
/// function/method, not just the violating ones.
pub fn scan_fragments(fragments: &[CodeFragment]) -> ViolationScan {
    let mut seen: HashSet<String> = HashSet::new();
    let mut violations = Vec::new();
    let mut functions_checked = 0usize;
    let mut cyclomatic_sum = 0f64;
    let mut cyclomatic_count = 0usize;
    let mut max_cyclomatic = 0f64;

    for fragment in fragments {
        if !fragment.kind.is_callable() || !seen.insert(fragment.dedupe_key()) {
            continue;
        }
        functions_checked += 1;
        if let Some(cyclomatic) = fragment.cyclomatic() {
            let value = f64::from(cyclomatic);
            cyclomatic_sum += value;
            cyclomatic_count += 1;
            if value > max_cyclomatic {
                max_cyclomatic = value;
            }
        }
        violations.extend(check_fragment(fragment));
    }

    let average_cyclomatic = if cyclomatic_count > 0 {
        cyclomatic_sum / cyclomatic_count as f64
    } else {
        0.0
    };

    ViolationScan {
        violations,
        functions_checked,
        average_cyclomatic,
        max_cyclomatic,
    }
}

// ========== Display ==========

/// Render minutes of understanding time: more than an hour as `"{h}h {m}m"`,
/// an hour or less as `"{m}m"` (exactly 60 minutes renders `60m`). Rounds to
/// whole minutes first.
pub fn format_effort_minutes(minutes: f64) -> String {
    let rounded = minutes.round().max(0.0) as u64;
    if rounded > 60 {
        format!("{}h {}m", rounded / 60, rounded % 60)
    } else {
        format!("{}m", rounded)
    }
}
