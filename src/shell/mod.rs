//! Interactive command shell
//!
//! Line-oriented commands over the utility layer, used by the binary.

mod handlers;
mod parser;

pub use handlers::handle_command;
pub use parser::{Command, CommandResult, parse_command};
