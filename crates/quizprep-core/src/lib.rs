//! quizprep-core — Data model, response normalizer, and quiz pipeline.
//!
//! This crate holds everything that does not talk to the network or the
//! terminal: notes and quiz records, the normalizer that turns generator
//! output into a fixed-length question set, prompt construction, sessions,
//! the JSON record store, history statistics, and document import.

pub mod error;
pub mod extract;
pub mod model;
pub mod normalize;
pub mod quiz;
pub mod session;
pub mod statistics;
pub mod store;
pub mod text;
pub mod traits;
