//! Sensitive-marker detection
//!
//! Scans extracted document text for email addresses, Windows-style
//! absolute paths and configured keywords.

use metaprobe_core::{FindingKind, SensitiveFinding};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Compiled regex patterns (initialized once at startup)
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}")
        .expect("Email regex is hardcoded and valid")
});

static WINDOWS_PATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[A-Z]:\\(?:[^\\/:*?"<>|\r\n]+\\)*"#)
        .expect("Windows path regex is hardcoded and valid")
});

/// Pattern matchers for sensitive markers in document text.
///
/// Keywords are matched case-insensitively as literal substrings.
#[derive(Debug, Clone)]
pub struct SensitiveDetector {
    email: Regex,
    path: Regex,
    keywords: Vec<(String, Regex)>,
}

impl SensitiveDetector {
    /// Create a detector for the given keyword list.
    ///
    /// Blank keywords are ignored.
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        let keywords = keywords
            .iter()
            .map(|kw| kw.as_ref().trim())
            .filter(|kw| !kw.is_empty())
            .filter_map(|kw| {
                match Regex::new(&format!("(?i){}", regex::escape(kw))) {
                    Ok(re) => Some((kw.to_string(), re)),
                    Err(e) => {
                        warn!("Skipping keyword {:?}: {}", kw, e);
                        None
                    }
                }
            })
            .collect();

        Self {
            email: EMAIL_PATTERN.clone(),
            path: WINDOWS_PATH_PATTERN.clone(),
            keywords,
        }
    }

    /// Configured keywords, in configuration order.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(|(kw, _)| kw.as_str())
    }

    /// Run the email, path and keyword passes over `text`.
    ///
    /// Each pass with at least one match contributes one finding whose
    /// values are unique and sorted. Findings come out in the order
    /// email, path, keyword.
    pub fn detect(&self, text: &str) -> Vec<SensitiveFinding> {
        let mut findings = Vec::new();

        let emails: BTreeSet<&str> = self.email.find_iter(text).map(|m| m.as_str()).collect();
        push_finding(&mut findings, FindingKind::Email, emails);

        let paths: BTreeSet<&str> = self.path.find_iter(text).map(|m| m.as_str()).collect();
        push_finding(&mut findings, FindingKind::Path, paths);

        let keywords: BTreeSet<&str> = self
            .keywords
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(kw, _)| kw.as_str())
            .collect();
        push_finding(&mut findings, FindingKind::Keyword, keywords);

        if !findings.is_empty() {
            debug!("Detected {} sensitive finding kinds", findings.len());
        }

        findings
    }
}

impl Default for SensitiveDetector {
    fn default() -> Self {
        Self::new(&metaprobe_core::DetectionConfig::default().keywords)
    }
}

fn push_finding(findings: &mut Vec<SensitiveFinding>, kind: FindingKind, values: BTreeSet<&str>) {
    if values.is_empty() {
        return;
    }
    findings.push(SensitiveFinding {
        kind,
        values: values.into_iter().map(str::to_string).collect(),
    });
}
