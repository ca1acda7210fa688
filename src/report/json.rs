//! JSON output for the history log.
//!
//! Same shape as the stored log, pretty-printed for scripting and piping.

use crate::history::HistoryLog;

pub fn render(log: &HistoryLog) -> String {
    serde_json::to_string_pretty(log.entries()).unwrap_or_else(|_| String::from("[]"))
}
