//! Terminal output helpers.

pub mod report;
pub mod tables;

pub use report::{
    HISTORY_TABLE_WIDTH, SCORE_TABLE_WIDTH, history_header, history_row, run_summary_lines,
    score_header, score_row,
};
pub use tables::{format_optional, print_separator, truncate_string};
