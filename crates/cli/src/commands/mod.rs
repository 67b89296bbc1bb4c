//! Command handlers for the sitechat CLI.

mod ask;
mod serve;

pub use ask::AskCommand;
pub use serve::ServeCommand;
