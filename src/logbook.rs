//! Markdown conversation logs and their retention.
//!
//! Every chat query (successful or not) and every "export full log" command
//! produces one markdown file named `ai_conversation_YYYYMMDD_HHMMSS.md`.
//! Files are written once and never re-read by lchat; they are meant for
//! humans.

use crate::core::error::LchatError;
use crate::session::Exchange;
use chrono::{DateTime, Local};
use regex::Regex;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

pub const LOG_FILE_PREFIX: &str = "ai_conversation_";
pub const LANGUAGE: &str = "en";

static LOG_FILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ai_conversation_\d{8}_\d{6}(_\d+)?\.md$").expect("log file pattern")
});

/// Everything that goes into one log file.
#[derive(Debug, Clone)]
pub struct LogDocument<'a> {
    pub timestamp: DateTime<Local>,
    pub model: &'a str,
    pub system_prompt: &'a str,
    pub temperature: f32,
    pub line_wrap: i64,
    pub endpoint: &'a str,
    pub response_time: Duration,
    pub history: &'a [Exchange],
    pub user_prompt: &'a str,
    pub ai_response: &'a str,
    pub error: Option<&'a str>,
}

impl LogDocument<'_> {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("# AI Conversation Log\n\n");
        let _ = writeln!(out, "**Timestamp:** {}  ", self.timestamp.to_rfc3339());
        let _ = writeln!(out, "**Model:** {}  ", self.model);
        let _ = writeln!(out, "**System Prompt:** {}  ", self.system_prompt);
        let _ = writeln!(out, "**Temperature:** {}  ", self.temperature);
        let _ = writeln!(out, "**Line Wrap Length:** {}  ", self.line_wrap);
        let _ = writeln!(out, "**API Endpoint:** {}  ", self.endpoint);
        let _ = writeln!(
            out,
            "**Response Time (seconds):** {:.2}  ",
            self.response_time.as_secs_f64()
        );
        let _ = writeln!(out, "**Language:** {}  ", LANGUAGE);

        out.push_str("\n#### Full Conversation History\n");
        for exchange in self.history {
            let _ = write!(
                out,
                "- **User**: {}\n- **AI**: {}\n\n",
                exchange.user, exchange.ai
            );
        }

        if !self.user_prompt.is_empty() || !self.ai_response.is_empty() {
            out.push_str("\n#### Latest Exchange  \n");
            let _ = writeln!(out, "**User Prompt:** {}  ", self.user_prompt);
            let _ = writeln!(out, "**AI Response:** {}  ", self.ai_response);
        }

        if let Some(error) = self.error {
            let _ = writeln!(out, "\n**Error:** {}", error);
        }
        out
    }
}

fn log_file_name(now: DateTime<Local>, attempt: u32) -> String {
    let stamp = now.format("%Y%m%d_%H%M%S");
    if attempt == 0 {
        format!("{}{}.md", LOG_FILE_PREFIX, stamp)
    } else {
        format!("{}{}_{}.md", LOG_FILE_PREFIX, stamp, attempt)
    }
}

/// Write `content` to a fresh timestamped file under `directory`.
///
/// The write is not atomic: a crash mid-write leaves a partial file.
pub fn save_log(directory: &Path, content: &str) -> Result<PathBuf, LchatError> {
    fs::create_dir_all(directory)?;

    let now = Local::now();
    let mut attempt = 0;
    let path = loop {
        let candidate = directory.join(log_file_name(now, attempt));
        if !candidate.exists() {
            break candidate;
        }
        attempt += 1;
    };

    fs::write(&path, content)?;
    Ok(path)
}

pub fn is_log_file(name: &str) -> bool {
    LOG_FILE_PATTERN.is_match(name)
}

#[derive(Debug, Default)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Delete logs older than `retention_days`. Zero or less disables retention.
pub fn cleanup_logs(directory: &Path, retention_days: i64) -> Result<CleanupReport, LchatError> {
    if retention_days <= 0 {
        return Ok(CleanupReport::default());
    }
    remove_logs_older_than(directory, retention_cutoff(SystemTime::now(), retention_days))
}

/// `now` minus the retention window. A window reaching past the epoch keeps everything.
fn retention_cutoff(now: SystemTime, retention_days: i64) -> SystemTime {
    u64::try_from(retention_days)
        .ok()
        .and_then(|days| days.checked_mul(SECONDS_PER_DAY))
        .and_then(|secs| now.checked_sub(Duration::from_secs(secs)))
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Remove log files whose modification time is strictly before `cutoff`.
pub fn remove_logs_older_than(
    directory: &Path,
    cutoff: SystemTime,
) -> Result<CleanupReport, LchatError> {
    let mut report = CleanupReport::default();
    if !directory.is_dir() {
        return Ok(report);
    }

    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if !is_log_file(&entry.file_name().to_string_lossy()) {
            continue;
        }

        let path = entry.path();
        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                warn!("Cannot read modification time of {}: {}", path.display(), e);
                continue;
            }
        };
        if modified >= cutoff {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted old log: {}", path.display());
                report.removed.push(path);
            }
            Err(e) => {
                warn!("Failed to delete {}: {}", path.display(), e);
                report.failed.push(path);
            }
        }
    }

    Ok(report)
}
