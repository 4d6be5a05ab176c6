//! Failed-login detection over raw authentication logs.
//!
//! A deliberately simple substring heuristic: a line counts as one failed
//! attempt when it contains the failure marker, and the source is the token
//! following the last `from ` on that line.

use std::collections::HashMap;
use std::path::Path;

use custodia_types::Severity;

use crate::error::{CustodiaError, Result};

/// Marker sshd writes for a rejected password.
pub const DEFAULT_FAILURE_MARKER: &str = "Failed password";

/// Source recorded when a failure line names no address.
pub const UNKNOWN_SOURCE: &str = "UNKNOWN";

const SOURCE_PREFIX: &str = "from ";

/// Attempt counts at or above which a source is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityThresholds {
    pub high: u32,
    pub medium: u32,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self { high: 5, medium: 3 }
    }
}

impl SeverityThresholds {
    pub fn classify(&self, failed_attempts: u32) -> Severity {
        if failed_attempts >= self.high {
            Severity::High
        } else if failed_attempts >= self.medium {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// Failed attempts observed for one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptCount {
    pub source_ip: String,
    pub failed_attempts: u32,
}

/// Groups failed authentication lines by source.
#[derive(Debug, Clone)]
pub struct FailedLoginDetector {
    failure_marker: String,
    thresholds: SeverityThresholds,
}

impl Default for FailedLoginDetector {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_MARKER, SeverityThresholds::default())
    }
}

impl FailedLoginDetector {
    pub fn new(failure_marker: impl Into<String>, thresholds: SeverityThresholds) -> Self {
        Self {
            failure_marker: failure_marker.into(),
            thresholds,
        }
    }

    pub fn failure_marker(&self) -> &str {
        &self.failure_marker
    }

    pub fn thresholds(&self) -> SeverityThresholds {
        self.thresholds
    }

    pub fn classify(&self, failed_attempts: u32) -> Severity {
        self.thresholds.classify(failed_attempts)
    }

    /// Counts failure lines per source, in order of first appearance.
    pub fn count_failures<I, S>(&self, lines: I) -> Vec<AttemptCount>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts: Vec<AttemptCount> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for line in lines {
            let line = line.as_ref();
            if !line.contains(self.failure_marker.as_str()) {
                continue;
            }

            let source = source_of(line);
            match index.get(source) {
                Some(&i) => {
                    counts[i].failed_attempts = counts[i].failed_attempts.saturating_add(1);
                }
                None => {
                    index.insert(source.to_string(), counts.len());
                    counts.push(AttemptCount {
                        source_ip: source.to_string(),
                        failed_attempts: 1,
                    });
                }
            }
        }

        counts
    }
}

fn source_of(line: &str) -> &str {
    line.rfind(SOURCE_PREFIX)
        .and_then(|at| line[at + SOURCE_PREFIX.len()..].split_whitespace().next())
        .unwrap_or(UNKNOWN_SOURCE)
}

/// Reads a log file into lines.
pub fn read_log_file(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            CustodiaError::NotFound(format!("log file {}", path.display()))
        } else {
            CustodiaError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    Ok(text.lines().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn failure(ip: &str) -> String {
        format!("Jan 10 10:00:00 host sshd[1]: Failed password for root from {ip} port 22 ssh2")
    }

    #[test]
    fn groups_by_source_in_first_seen_order() {
        let lines = vec![
            failure("10.0.0.2"),
            failure("10.0.0.1"),
            "Accepted password for bob from 10.0.0.9 port 22".to_string(),
            failure("10.0.0.2"),
        ];

        let counts = FailedLoginDetector::default().count_failures(&lines);

        assert_eq!(
            counts,
            vec![
                AttemptCount {
                    source_ip: "10.0.0.2".to_string(),
                    failed_attempts: 2
                },
                AttemptCount {
                    source_ip: "10.0.0.1".to_string(),
                    failed_attempts: 1
                },
            ]
        );
    }

    #[test]
    fn missing_source_is_unknown() {
        let counts = FailedLoginDetector::default()
            .count_failures(["Failed password for root", "Failed password from "]);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].source_ip, UNKNOWN_SOURCE);
        assert_eq!(counts[0].failed_attempts, 2);
    }

    #[test]
    fn last_from_wins() {
        let line = "Failed password for user from home from 192.168.1.7 port 22";
        assert_eq!(source_of(line), "192.168.1.7");
    }

    #[test]
    fn custom_marker() {
        let detector = FailedLoginDetector::new("authentication failure", SeverityThresholds::default());
        let counts = detector.count_failures([
            "pam_unix: authentication failure; from 10.1.1.1",
            "Failed password for root from 10.1.1.2 port 22",
        ]);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].source_ip, "10.1.1.1");
    }

    #[test]
    fn no_failures_no_counts() {
        let lines: Vec<String> = Vec::new();
        assert!(FailedLoginDetector::default().count_failures(&lines).is_empty());
    }

    #[test_case(0 => Severity::Low)]
    #[test_case(2 => Severity::Low)]
    #[test_case(3 => Severity::Medium)]
    #[test_case(4 => Severity::Medium)]
    #[test_case(5 => Severity::High)]
    #[test_case(50 => Severity::High)]
    fn default_classification(attempts: u32) -> Severity {
        SeverityThresholds::default().classify(attempts)
    }

    #[test]
    fn read_missing_log_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_log_file(&dir.path().join("auth.log")).unwrap_err();
        assert!(matches!(err, CustodiaError::NotFound(_)));
    }

    #[test]
    fn read_log_splits_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.log");
        std::fs::write(&path, "one\ntwo\r\nthree").unwrap();
        assert_eq!(read_log_file(&path).unwrap(), vec!["one", "two", "three"]);
    }
}
