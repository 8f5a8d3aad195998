//! quizprep-report — Self-contained HTML reports of quiz history.

pub mod html;

pub use html::{generate_html, write_html_report};
