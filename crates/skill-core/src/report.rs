//! Analysis report for one input text.

use crate::enrich::EnrichedSkill;
use crate::extract::Mentions;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything `analyze` found in a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillReport {
    /// When the report was produced (UTC).
    pub generated_at: DateTime<Utc>,
    /// SHA-256 of the taxonomy the report was computed against.
    pub taxonomy_digest: String,
    /// Threshold used for the fuzzy matching stages.
    pub threshold: f64,
    /// Raw mentions by category, including surface forms that did not match.
    pub mentions: Mentions,
    /// Ranked top records.
    pub top: Vec<EnrichedSkill>,
}

impl SkillReport {
    pub fn new(
        taxonomy_digest: impl Into<String>,
        threshold: f64,
        mentions: Mentions,
        top: Vec<EnrichedSkill>,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            taxonomy_digest: taxonomy_digest.into(),
            threshold,
            mentions,
            top,
        }
    }

    /// Override the timestamp, for reproducible output.
    pub fn with_generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// Records that resolved to a taxonomy skill.
    pub fn matched(&self) -> impl Iterator<Item = &EnrichedSkill> + '_ {
        self.top.iter().filter(|r| r.confidence > 0.0)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(canonical: &str, confidence: f64) -> EnrichedSkill {
        EnrichedSkill {
            original: canonical.to_string(),
            canonical: canonical.to_string(),
            confidence,
            category: "languages".to_string(),
        }
    }

    #[test]
    fn serializes_with_stable_field_names() {
        let mut mentions = Mentions::new();
        mentions.insert("languages", "python");
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let report = SkillReport::new("abc", 0.5, mentions, vec![record("python", 1.0)])
            .with_generated_at(at);

        let value: serde_json::Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
        assert_eq!(value["taxonomy_digest"], "abc");
        assert_eq!(value["generated_at"], "2024-01-02T03:04:05Z");
        assert_eq!(value["mentions"]["languages"][0], "python");
        assert_eq!(value["top"][0]["canonical"], "python");
        assert_eq!(value["top"][0]["confidence"], 1.0);
    }

    #[test]
    fn matched_skips_zero_confidence() {
        let report = SkillReport::new(
            "abc",
            0.5,
            Mentions::new(),
            vec![record("python", 1.0), record("cobol", 0.0)],
        );
        let matched: Vec<&str> = report.matched().map(|r| r.canonical.as_str()).collect();
        assert_eq!(matched, vec!["python"]);
    }

    #[test]
    fn round_trips_through_json() {
        let report = SkillReport::new("abc", 0.7, Mentions::new(), Vec::new());
        let json = serde_json::to_string(&report).unwrap();
        let back: SkillReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
