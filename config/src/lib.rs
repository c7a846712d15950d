//! Groups configurations used throughout the stats agent passed to the CLI

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(unsafe_code)]

mod cli;
pub mod parsing;
pub mod validation;

pub use cli::*;
pub use parsing::parse_command_line_args;
