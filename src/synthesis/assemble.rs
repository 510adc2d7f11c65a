use super::Report;
use crate::config::ProviderId;
use regex::Regex;
use std::collections::HashSet;

/// Lines at or below this length are headings or fragments, not key points.
const MIN_POINT_LEN: usize = 40;

struct Section {
    title: &'static str,
    keywords: &'static [&'static str],
}

/// Fixed report outline. A key point lands in every section whose keyword
/// set it matches; thematic overlap across sections is accepted.
const SECTIONS: [Section; 10] = [
    Section {
        title: "Executive Summary",
        keywords: &["summary", "overall", "in essence", "key finding", "at its core"],
    },
    Section {
        title: "Technology Overview",
        keywords: &["technology", "architecture", "component", "design", "platform", "framework"],
    },
    Section {
        title: "Technical Analysis",
        keywords: &[
            "implementation",
            "performance",
            "scalab",
            "latency",
            "throughput",
            "infrastructure",
            "deployment",
            "technical",
        ],
    },
    Section {
        title: "Market Analysis",
        keywords: &["market", "industry", "adoption", "investment", "competit", "growth", "vendor"],
    },
    Section {
        title: "Security and Compliance",
        keywords: &["security", "privacy", "compliance", "encryption", "vulnerab", "regulat", "audit"],
    },
    Section {
        title: "Integration and Implementation",
        keywords: &["integration", "api", "interoperab", "migration", "compatib", "tooling", "sdk"],
    },
    Section {
        title: "Future Outlook",
        keywords: &["future", "trend", "emerging", "roadmap", "forecast", "projection", "evolv"],
    },
    Section {
        title: "Strategic Recommendations",
        keywords: &["recommend", "should", "consider", "strategy", "best practice", "advis"],
    },
    Section {
        title: "Risk Assessment",
        keywords: &["risk", "challenge", "limitation", "concern", "threat", "drawback"],
    },
    Section {
        title: "Conclusion",
        keywords: &["conclusion", "in summary", "ultimately", "takeaway"],
    },
];

/// Strip markdown decoration so identical statements from different
/// providers compare equal: links become their text, emphasis markers and
/// list bullets go away, and runs of blank lines collapse.
fn normalize(text: &str) -> String {
    let link = Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("static regex");
    let list_marker = Regex::new(r"(?m)^\s*(?:[-*+]|\d+[.)])\s+").expect("static regex");
    // Single underscores survive so snake_case identifiers stay intact.
    let emphasis = Regex::new(r"\*{1,2}|_{2}|`").expect("static regex");
    let blank_runs = Regex::new(r"\n{3,}").expect("static regex");

    let text = link.replace_all(text, "$1");
    let text = list_marker.replace_all(&text, "");
    let text = emphasis.replace_all(&text, "");
    let text = blank_runs.replace_all(&text, "\n\n");

    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

/// A line qualifies as a key point when it is long enough to carry a
/// statement and is not a heading (markdown or ALL-CAPS).
fn extract_key_points(normalized: &str) -> Vec<String> {
    normalized
        .lines()
        .map(str::trim)
        .filter(|line| line.len() > MIN_POINT_LEN)
        .filter(|line| !line.starts_with('#'))
        .filter(|line| !is_upper_header(line))
        .map(str::to_string)
        .collect()
}

fn is_upper_header(line: &str) -> bool {
    let mut has_letter = false;
    for c in line.chars() {
        if c.is_alphabetic() {
            has_letter = true;
            if c.is_lowercase() {
                return false;
            }
        }
    }
    has_letter
}

/// Deterministic fallback synthesis: mine key points out of the successful
/// analyses and assemble them into the fixed outline. Empty sections render
/// with an empty body; this function never fails.
pub fn assemble_report(topic: &str, input: &[(ProviderId, String)]) -> Report {
    let mut seen: HashSet<String> = HashSet::new();
    let mut points: Vec<String> = Vec::new();

    for (_, analysis) in input {
        let normalized = normalize(analysis);
        for point in extract_key_points(&normalized) {
            // Exact-match dedup across providers, first appearance wins.
            if seen.insert(point.clone()) {
                points.push(point);
            }
        }
    }

    let lowered: Vec<String> = points.iter().map(|p| p.to_lowercase()).collect();

    let mut body = format!("# Research Report: {topic}\n");

    for section in &SECTIONS {
        body.push_str(&format!("\n## {}: {}\n", section.title, topic));

        let matched: Vec<&str> = points
            .iter()
            .zip(&lowered)
            .filter(|(_, lower)| section.keywords.iter().any(|k| lower.contains(k)))
            .map(|(point, _)| point.as_str())
            .collect();

        if !matched.is_empty() {
            body.push('\n');
            for point in matched {
                body.push_str(&format!("- {point}\n"));
            }
        }
    }

    Report::new(topic, body)
}
