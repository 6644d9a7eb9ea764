pub mod completions;
pub mod streaming;
