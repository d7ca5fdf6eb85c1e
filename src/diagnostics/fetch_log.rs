use std::collections::HashMap;
use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Fetch log entry (JSONL)
// ---------------------------------------------------------------------------

/// One backend call, as appended to `~/.cargaboard/fetch-log.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchLogEntry {
    pub timestamp: String,
    pub method: String,
    /// Endpoint path without query string, e.g. `/api/stats/last`.
    pub endpoint: String,
    /// HTTP status, or `None` when the request never got a response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub ok: bool,
    pub latency_ms: u64,
}

impl FetchLogEntry {
    pub fn now(method: &str, endpoint: &str, status: Option<u16>, latency_ms: u64) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            method: method.to_string(),
            endpoint: strip_query(endpoint).to_string(),
            status,
            ok: matches!(status, Some(s) if (200..300).contains(&s)),
            latency_ms,
        }
    }
}

fn strip_query(endpoint: &str) -> &str {
    endpoint.split('?').next().unwrap_or(endpoint)
}

// ---------------------------------------------------------------------------
// Log handle
// ---------------------------------------------------------------------------

/// Append-only JSONL log. A disabled log drops every entry.
#[derive(Debug, Clone, Default)]
pub struct FetchLog {
    path: Option<PathBuf>,
}

impl FetchLog {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    /// Build the log from the `[logging]` section.
    pub fn from_config(config: &crate::config::schema::LoggingConfig) -> Self {
        if config.enabled {
            Self::at(crate::config::schema::expand_home(&config.path))
        } else {
            Self::disabled()
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append an entry. Failures are reported through `tracing` only.
    pub fn record(&self, entry: &FetchLogEntry) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = append_entry(path, entry) {
            tracing::debug!(path = %path.display(), error = %e, "fetch log write failed");
        }
    }

    /// Read every entry, skipping malformed lines.
    pub fn read_all(&self) -> Vec<FetchLogEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };
        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };
        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<FetchLogEntry>(&line).ok())
            .collect()
    }

    /// Entries from the last `hours` hours.
    pub fn read_since_hours(&self, hours: u32) -> Vec<FetchLogEntry> {
        let cutoff = (Utc::now() - chrono::Duration::hours(i64::from(hours))).to_rfc3339();
        self.read_all()
            .into_iter()
            .filter(|e| e.timestamp >= cutoff)
            .collect()
    }
}

fn append_entry(path: &Path, entry: &FetchLogEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Per-endpoint call counts.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointStat {
    pub endpoint: String,
    pub calls: usize,
    pub failures: usize,
    pub avg_latency_ms: f64,
}

/// Aggregate view of a set of fetch log entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FetchSummary {
    pub calls: usize,
    pub failures: usize,
    pub unauthorized: usize,
    pub avg_latency_ms: f64,
    /// Sorted by call count, busiest first.
    pub endpoints: Vec<EndpointStat>,
}

impl FetchSummary {
    /// Failed calls as a percentage; 0 when there were no calls.
    pub fn failure_pct(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.failures as f64 / self.calls as f64 * 100.0
        }
    }
}

pub fn summarize(entries: &[FetchLogEntry]) -> FetchSummary {
    if entries.is_empty() {
        return FetchSummary::default();
    }

    let mut by_endpoint: HashMap<&str, (usize, usize, u64)> = HashMap::new();
    for e in entries {
        let slot = by_endpoint.entry(e.endpoint.as_str()).or_default();
        slot.0 += 1;
        if !e.ok {
            slot.1 += 1;
        }
        slot.2 += e.latency_ms;
    }

    let mut endpoints: Vec<EndpointStat> = by_endpoint
        .into_iter()
        .map(|(endpoint, (calls, failures, latency))| EndpointStat {
            endpoint: endpoint.to_string(),
            calls,
            failures,
            avg_latency_ms: latency as f64 / calls as f64,
        })
        .collect();
    endpoints.sort_by(|a, b| b.calls.cmp(&a.calls).then_with(|| a.endpoint.cmp(&b.endpoint)));

    let total_latency: u64 = entries.iter().map(|e| e.latency_ms).sum();
    FetchSummary {
        calls: entries.len(),
        failures: entries.iter().filter(|e| !e.ok).count(),
        unauthorized: entries.iter().filter(|e| e.status == Some(401)).count(),
        avg_latency_ms: total_latency as f64 / entries.len() as f64,
        endpoints,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log(name: &str) -> FetchLog {
        let path = std::env::temp_dir()
            .join(format!("cargaboard-fetchlog-{}-{name}", std::process::id()))
            .join("fetch-log.jsonl");
        let _ = fs::remove_file(&path);
        FetchLog::at(path)
    }

    #[test]
    fn entry_strips_query_and_flags_status() {
        let e = FetchLogEntry::now("GET", "/api/stats/last?station=all&filter=total", Some(200), 12);
        assert_eq!(e.endpoint, "/api/stats/last");
        assert!(e.ok);
        assert!(!FetchLogEntry::now("GET", "/x", Some(401), 1).ok);
        assert!(!FetchLogEntry::now("GET", "/x", None, 1).ok);
    }

    #[test]
    fn record_then_read_back() {
        let log = temp_log("rw");
        log.record(&FetchLogEntry::now("GET", "/api/stats/last", Some(200), 5));
        log.record(&FetchLogEntry::now("POST", "/api/stats/auth/login", Some(401), 9));
        let entries = log.read_all();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].method, "POST");
        assert_eq!(log.read_since_hours(1).len(), 2);
    }

    #[test]
    fn disabled_log_is_silent() {
        let log = FetchLog::disabled();
        log.record(&FetchLogEntry::now("GET", "/x", Some(200), 1));
        assert!(log.read_all().is_empty());
        assert!(log.path().is_none());
    }

    #[test]
    fn summary_counts_failures_per_endpoint() {
        let entries = vec![
            FetchLogEntry::now("GET", "/api/stats/last", Some(200), 10),
            FetchLogEntry::now("GET", "/api/stats/last", Some(500), 30),
            FetchLogEntry::now("GET", "/api/stats/auth/me", Some(401), 2),
        ];
        let s = summarize(&entries);
        assert_eq!(s.calls, 3);
        assert_eq!(s.failures, 2);
        assert_eq!(s.unauthorized, 1);
        assert_eq!(s.endpoints[0].endpoint, "/api/stats/last");
        assert_eq!(s.endpoints[0].avg_latency_ms, 20.0);
        assert!((s.failure_pct() - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(summarize(&[]).failure_pct(), 0.0);
    }
}
