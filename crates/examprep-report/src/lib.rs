//! examprep-report: rendering of exam reports beyond JSON and markdown.

pub mod html;

pub use html::{generate_html, write_html_report};
