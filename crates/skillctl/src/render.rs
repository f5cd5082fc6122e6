//! Output rendering for skillctl.
//!
//! Plain tables on stdout; JSON output is handled by the caller.

use serde::Serialize;
use skill_core::{Mentions, SkillMatch, SkillReport, Taxonomy};

/// JSON shape for one `match` result.
#[derive(Debug, Serialize)]
pub struct MatchRecord<'a> {
    pub input: &'a str,
    #[serde(flatten)]
    pub result: &'a SkillMatch,
}

impl<'a> From<&'a (String, SkillMatch)> for MatchRecord<'a> {
    fn from((input, result): &'a (String, SkillMatch)) -> Self {
        Self { input, result }
    }
}

/// Print mentions grouped by category.
pub fn print_mentions(mentions: &Mentions) {
    if mentions.is_empty() {
        println!("No skills found.");
        return;
    }

    for (category, skills) in mentions.iter() {
        println!("{}:", category);
        for skill in skills {
            println!("  {}", skill);
        }
    }

    println!();
    println!("{} skill(s)", mentions.len());
}

/// Print match results in tabular format.
pub fn print_matches(results: &[(String, SkillMatch)]) {
    println!(
        "{:<24}  {:<24}  {:<10}  {:<11}",
        "INPUT", "CANONICAL", "CONFIDENCE", "STAGE"
    );
    println!("{}", "-".repeat(75));

    for (input, m) in results {
        println!(
            "{:<24}  {:<24}  {:<10}  {:<11}",
            truncate(input, 24),
            truncate(&m.canonical, 24),
            format_confidence(m.confidence),
            m.stage.as_str(),
        );
    }
}

/// Print an analysis report: ranked skills plus mentions that did not match.
pub fn print_report(report: &SkillReport) {
    println!("Generated: {}", report.generated_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Taxonomy:  {}", truncate(&report.taxonomy_digest, 16));
    println!("Threshold: {}", report.threshold);
    println!();

    if report.top.is_empty() {
        println!("No skills found.");
        return;
    }

    println!(
        "{:<4}  {:<24}  {:<24}  {:<10}  {:<20}",
        "#", "CANONICAL", "ORIGINAL", "CONFIDENCE", "CATEGORY"
    );
    println!("{}", "-".repeat(90));

    for (rank, record) in report.top.iter().enumerate() {
        println!(
            "{:<4}  {:<24}  {:<24}  {:<10}  {:<20}",
            rank + 1,
            truncate(&record.canonical, 24),
            truncate(&record.original, 24),
            format_confidence(record.confidence),
            truncate(&record.category, 20),
        );
    }

    println!();
    println!(
        "{} of {} mention(s) shown, {} matched",
        report.top.len(),
        report.mentions.len(),
        report.matched().count()
    );
}

/// Print taxonomy categories with their skills.
pub fn print_categories(taxonomy: &Taxonomy) {
    for category in taxonomy.categories() {
        println!("{} ({})", category.name, category.skills.len());
        println!("  {}", category.skills.join(", "));
    }

    println!();
    println!(
        "{} categories, {} skills",
        taxonomy.categories().len(),
        taxonomy.len()
    );
}

fn format_confidence(confidence: f64) -> String {
    format!("{:.3}", confidence)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
