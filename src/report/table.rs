//! Terminal table rendering for the history log.
//!
//! One row per entry in insertion order, with the payload truncated to
//! keep rows on one line.

use crate::history::HistoryLog;

const DATA_WIDTH: usize = 40;

pub fn render(log: &HistoryLog) -> String {
    if log.is_empty() {
        return String::from("No history yet.\n");
    }

    let mut output = String::new();

    output.push_str(&format!(
        "{:>4}  {:<24}  {:<22}  {}\n",
        "#", "Timestamp", "Location", "Data"
    ));
    output.push_str(&"-".repeat(4 + 2 + 24 + 2 + 22 + 2 + DATA_WIDTH));
    output.push('\n');

    for (index, entry) in log.entries().iter().enumerate() {
        let location = entry
            .location
            .map(|coords| coords.to_string())
            .unwrap_or_else(|| "-".to_string());

        output.push_str(&format!(
            "{:>4}  {:<24}  {:<22}  {}\n",
            index + 1,
            truncate(&entry.timestamp, 24),
            location,
            truncate(&single_line(&entry.data), DATA_WIDTH)
        ));
    }

    output.push_str(&format!("\n{} entries\n", log.len()));

    output
}

fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}
