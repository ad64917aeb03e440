//! CLI domain: parse, route, output, and presentation only.
//! Document behaviour lives in `ContentContext`; handlers stay thin.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, DocumentArgs};
pub use presentation::{
    format_generation_outcome, format_status_json, format_status_text, format_versions_json,
    format_versions_table, DocumentStatus,
};
pub use route::RunContext;
