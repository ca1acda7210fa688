pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod lifecycle;
pub mod recorder;
pub mod report;
pub mod scanner;
pub mod screen;
pub mod store;
