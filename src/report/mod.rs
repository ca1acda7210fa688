pub mod table;
pub mod json;

use crate::history::HistoryLog;

pub fn print(log: &HistoryLog, json_output: bool) {
    if json_output {
        println!("{}", json::render(log));
    } else {
        print!("{}", table::render(log));
    }
}
