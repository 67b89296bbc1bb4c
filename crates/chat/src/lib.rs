//! Chat pipeline client for sitechat.
//!
//! This crate holds the client side of the chat pipeline: the stream
//! consumer that decodes the relay's byte stream into protocol frames, and
//! the conversation controller that drives one user turn from submission to
//! a committed assistant message.
//!
//! # Example
//! ```no_run
//! use sitechat_chat::{ChatController, RelayTransport};
//! use sitechat_core::CancelToken;
//! use sitechat_retrieval::{Retriever, StaticSource, TrigramEmbedder};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let retriever = Arc::new(Retriever::new(
//!     Arc::new(StaticSource::new(vec![])),
//!     Arc::new(TrigramEmbedder::default()),
//!     256,
//! ));
//! let transport = Arc::new(RelayTransport::new("http://127.0.0.1:8787"));
//! let mut controller =
//!     ChatController::new(retriever, transport, 3, Duration::from_secs(30));
//!
//! let outcome = controller.submit("opening hours", &CancelToken::new()).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod consumer;
pub mod controller;
pub mod conversation;
pub mod transport;

// Re-export commonly used types
pub use consumer::{Frame, FrameDecoder, StreamConsumer};
pub use controller::{ChatController, TurnOutcome, TurnPhase};
pub use conversation::{Conversation, Placeholder};
pub use transport::{ChatTransport, ClientTransport, RelayTransport};
