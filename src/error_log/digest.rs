//! Turns watchdog rows into the one-line digest written to the metrics log.

use chrono::DateTime;
use log::warn;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use super::php_unserialize::{UnserializeError, placeholder_map};
use super::{ErrorLogRow, ErrorLogStore, FETCH_FAILED, MAX_SEVERITY, NO_ERRORS, RECENT_LIMIT};
use crate::utils::flatten_whitespace;

/// Placeholder never shown in compiled messages
const BACKTRACE_PLACEHOLDER: &str = "@backtrace_string";

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[@%][A-Za-z0-9_]+").expect("PLACEHOLDER_RE: hardcoded regex is valid")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("TAG_RE: hardcoded regex is valid"));

/// Splice `variables` into `message` and reduce it to plain single-line text.
///
/// A token is replaced only when it is an exact key of the placeholder map,
/// so `@ids` is left alone when the map only knows `@id`.
pub fn compile_message(message: &str, variables: Option<&[u8]>) -> Result<String, UnserializeError> {
    let mut substitutions: HashMap<String, String> = match variables {
        Some(payload) => placeholder_map(payload)?,
        None => HashMap::new(),
    };
    substitutions.remove(BACKTRACE_PLACEHOLDER);

    let message = message.replace(BACKTRACE_PLACEHOLDER, "");
    let compiled = PLACEHOLDER_RE.replace_all(&message, |caps: &regex::Captures<'_>| {
        let token = &caps[0];
        substitutions
            .get(token)
            .cloned()
            .unwrap_or_else(|| token.to_string())
    });
    let stripped = TAG_RE.replace_all(&compiled, "");
    Ok(flatten_whitespace(&stripped))
}

/// `<timestamp> [<severity>] <type>-<message>`
#[must_use]
pub fn format_entry(row: &ErrorLogRow, compiled_message: &str) -> String {
    let when = DateTime::from_timestamp(row.timestamp, 0).map_or_else(
        || row.timestamp.to_string(),
        |ts| ts.format("%Y-%m-%d %H:%M:%S").to_string(),
    );
    format!(
        "{when} [{}] {}-{compiled_message}",
        row.severity, row.kind
    )
}

/// Qualifying log entries for `path` written since `since`, as one
/// flattened line.
///
/// Returns [`NO_ERRORS`] when nothing matches and [`FETCH_FAILED`] on any
/// backend or decode failure. Never fails.
pub async fn digest(store: &dyn ErrorLogStore, path: &str, since: i64) -> String {
    let rows = match store.query_recent(path, since, MAX_SEVERITY, RECENT_LIMIT).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!(target: "dualcrawl::error_log", "Error-log lookup for {path} failed: {e}");
            return FETCH_FAILED.to_string();
        }
    };

    if rows.is_empty() {
        return NO_ERRORS.to_string();
    }

    let mut entries = Vec::with_capacity(rows.len());
    for row in &rows {
        match compile_message(&row.message, row.variables.as_deref()) {
            Ok(message) => entries.push(format_entry(row, &message)),
            Err(e) => {
                warn!(
                    target: "dualcrawl::error_log",
                    "Watchdog row {} for {path} has undecodable variables: {e}",
                    row.wid
                );
                return FETCH_FAILED.to_string();
            }
        }
    }

    flatten_whitespace(&entries.join(" | "))
}
