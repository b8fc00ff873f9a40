//! Shared types used across metaprobe.
//!
//! This module defines the newtypes that identify scan jobs and the
//! origin a scan is confined to.

use crate::error::{MetaprobeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::{Origin, Url};

/// Opaque handle for a scan job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Create a new random `JobId` using UUID v4.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an existing handle string (e.g. one echoed back by a client).
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A site to crawl: the domain label records are filed under, the start URL,
/// and the origin (scheme + host + port) the crawler must not leave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    domain: String,
    url: Url,
}

impl ScanTarget {
    /// Parse a target given either as a bare domain (`example.com`,
    /// `example.com:8080`) or as a full `http`/`https` URL.
    ///
    /// Bare domains are prefixed with `default_scheme`.
    pub fn parse(input: &str, default_scheme: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(MetaprobeError::InvalidTarget {
                target: input.to_string(),
                reason: "target is empty".to_string(),
            });
        }

        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("{default_scheme}://{trimmed}")
        };

        let url = Url::parse(&candidate).map_err(|e| MetaprobeError::InvalidTarget {
            target: input.to_string(),
            reason: e.to_string(),
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(MetaprobeError::InvalidTarget {
                target: input.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        let host = url
            .host_str()
            .ok_or_else(|| MetaprobeError::InvalidTarget {
                target: input.to_string(),
                reason: "missing host".to_string(),
            })?
            .to_string();

        let domain = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host,
        };

        Ok(Self { domain, url })
    }

    /// Domain label stored on every artifact found by this scan.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Start URL of the crawl.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Site boundary: scheme + host + port.
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.url.origin()
    }

    /// Whether `link` lies within this target's origin.
    #[must_use]
    pub fn contains(&self, link: &Url) -> bool {
        link.origin() == self.url.origin()
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Parse a newline-delimited domain list.
///
/// Each line is trimmed; blank lines are ignored.
#[must_use]
pub fn parse_domain_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_generate() {
        let id1 = JobId::generate();
        let id2 = JobId::generate();
        assert_ne!(id1, id2);
        assert_eq!(JobId::from_string(id1.as_str()), id1);
    }

    #[test]
    fn test_target_bare_domain() {
        let target = ScanTarget::parse("example.com", "http").expect("valid target");
        assert_eq!(target.domain(), "example.com");
        assert_eq!(target.url().as_str(), "http://example.com/");
    }

    #[test]
    fn test_target_with_port() {
        let target = ScanTarget::parse("  127.0.0.1:8080 ", "http").expect("valid target");
        assert_eq!(target.domain(), "127.0.0.1:8080");
        assert_eq!(target.url().port(), Some(8080));
    }

    #[test]
    fn test_target_full_url() {
        let target = ScanTarget::parse("https://example.com/docs/", "http").expect("valid target");
        assert_eq!(target.domain(), "example.com");
        assert_eq!(target.url().scheme(), "https");
        assert_eq!(target.url().path(), "/docs/");
    }

    #[test]
    fn test_target_invalid() {
        assert!(ScanTarget::parse("", "http").is_err());
        assert!(ScanTarget::parse("   ", "http").is_err());
        assert!(ScanTarget::parse("ftp://example.com", "http").is_err());
        assert!(ScanTarget::parse("http://", "http").is_err());
    }

    #[test]
    fn test_origin_containment() {
        let target = ScanTarget::parse("example.com", "http").expect("valid target");

        let same = Url::parse("http://example.com/a/b.pdf").expect("url");
        let other_host = Url::parse("http://external.example/file.pdf").expect("url");
        let other_scheme = Url::parse("https://example.com/").expect("url");
        let other_port = Url::parse("http://example.com:8080/").expect("url");
        let mailto = Url::parse("mailto:someone@example.com").expect("url");

        assert!(target.contains(&same));
        assert!(!target.contains(&other_host));
        assert!(!target.contains(&other_scheme));
        assert!(!target.contains(&other_port));
        assert!(!target.contains(&mailto));
    }

    #[test]
    fn test_parse_domain_list() {
        let contents = "example.com\n\n   other.org  \n\t\nthird.net";
        assert_eq!(
            parse_domain_list(contents),
            vec!["example.com", "other.org", "third.net"]
        );
        assert!(parse_domain_list("\n \n").is_empty());
    }
}
