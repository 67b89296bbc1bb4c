//! Completion relay for sitechat.
//!
//! This crate bridges a structured conversation request to an upstream
//! text-completion provider, in either streaming or buffered mode, and
//! exposes that bridge over HTTP for browser chat clients.
//!
//! # Example
//! ```no_run
//! use sitechat_relay::{ChatRequest, CompletionClient, Message, OpenAiCompatClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenAiCompatClient::new("https://api.openai.com/v1", Some("sk-...".into()));
//! let request = ChatRequest::new("gpt-4o-mini", vec![Message::user("Hello!")]);
//! let completion = client.complete(&request).await?;
//! println!("{}", completion.answer().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod providers;
pub mod server;

// Re-export main types
pub use client::{
    ByteStream, ChatChoice, ChatCompletion, ChatRequest, ChoiceMessage, CompletionClient, Message,
    Role,
};
pub use providers::OpenAiCompatClient;
pub use server::{run_server, run_server_with_client, ChatTurnRequest};
