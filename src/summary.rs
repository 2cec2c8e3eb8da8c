use crate::normalize::RejectCounts;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

/// End-of-pass diagnostics: what was scanned, kept, and rejected and why
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub label: String,
    pub scanned: u64,
    pub kept: u64,
    pub rejected: u64,
    pub reasons: BTreeMap<String, u64>,
}

impl ScanSummary {
    pub fn new(label: impl Into<String>) -> Self {
        ScanSummary {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Count a record dropped for `reason`
    pub fn reject(&mut self, reason: &str) {
        self.rejected += 1;
        *self.reasons.entry(reason.to_string()).or_insert(0) += 1;
    }

    /// Fold in the normalizer's rejections
    pub fn absorb(&mut self, rejects: &RejectCounts) {
        self.rejected += rejects.total;
        for (reason, count) in &rejects.by_reason {
            *self.reasons.entry(reason.clone()).or_insert(0) += count;
        }
    }

    pub fn log(&self) {
        info!(
            pass = %self.label,
            scanned = self.scanned,
            kept = self.kept,
            rejected = self.rejected,
            "pass complete"
        );
        for (reason, count) in &self.reasons {
            info!(pass = %self.label, reason = %reason, count, "rejections");
        }
    }
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.label)?;
        writeln!(f, "  scanned:  {}", self.scanned)?;
        writeln!(f, "  kept:     {}", self.kept)?;
        write!(f, "  rejected: {}", self.rejected)?;
        for (reason, count) in &self.reasons {
            write!(f, "\n    {:>8}  {}", count, reason)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;

    #[test]
    fn test_absorb_and_reject() {
        let mut rejects = RejectCounts::default();
        rejects.record(&FieldError::missing("coords"));
        rejects.record(&FieldError::missing("coords"));

        let mut summary = ScanSummary::new("systems");
        summary.scanned = 10;
        summary.kept = 7;
        summary.absorb(&rejects);
        summary.reject("unkeyed");

        assert_eq!(summary.rejected, 3);
        assert_eq!(summary.reasons["coords:missing"], 2);

        let text = summary.to_string();
        assert!(text.starts_with("systems:"));
        assert!(text.contains("unkeyed"));
    }
}
