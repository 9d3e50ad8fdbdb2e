//! Message parsing for CLI output

mod parser;

pub use parser::parse_message;
