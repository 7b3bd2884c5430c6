//! Everything written after ranking: JSON artifacts, HTML pages and the text report.

pub mod chart;
pub mod json;
pub mod report;

pub use chart::write_pages;
pub use json::{read_owner, write_artifacts};
pub use report::{generate_text_report, print_summary};
