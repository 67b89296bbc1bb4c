//! Ask command handler.
//!
//! Runs one retrieval-augmented chat turn, streaming the answer to stdout.

use clap::Args;
use sitechat_chat::{ChatController, ChatTransport, ClientTransport, RelayTransport, TurnOutcome};
use sitechat_core::{config::AppConfig, AppError, AppResult, CancelToken};
use sitechat_relay::OpenAiCompatClient;
use sitechat_retrieval::{HttpSource, Retriever, TrigramEmbedder};
use std::sync::Arc;
use std::time::Duration;

/// Ask a question with retrieved site context
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub prompt: Option<String>,

    /// Read the question from a file
    #[arg(short, long)]
    pub file: Option<std::path::PathBuf>,

    /// Number of knowledge entries to retrieve
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Send the turn through a running relay instead of calling the
    /// provider directly
    #[arg(long)]
    pub relay: Option<String>,

    /// Output the full result as JSON instead of streaming text
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let prompt = self
            .get_prompt()
            .ok_or_else(|| AppError::Chat("No prompt provided".to_string()))?;

        let retriever = Arc::new(Retriever::new(
            Arc::new(HttpSource::new(config.knowledge_url.clone())),
            Arc::new(TrigramEmbedder::default()),
            config.cache_capacity,
        ));

        let transport: Arc<dyn ChatTransport> = match &self.relay {
            Some(relay_url) => Arc::new(RelayTransport::new(relay_url.clone())),
            None => Arc::new(ClientTransport::new(
                Arc::new(OpenAiCompatClient::from_config(config)),
                config,
            )),
        };

        let mut controller = ChatController::new(
            retriever,
            transport,
            self.top_k.unwrap_or(config.top_k),
            Duration::from_secs(config.stream_read_timeout_secs),
        );

        // Ctrl-C cancels the in-flight turn instead of killing the process
        // mid-stream
        let cancel = CancelToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                canceller.cancel();
            }
        });

        let streaming_to_stdout = !self.json;
        let outcome = controller
            .submit_with_progress(&prompt, &cancel, |delta| {
                if streaming_to_stdout {
                    print!("{}", delta);
                    use std::io::Write;
                    std::io::stdout().flush().ok();
                }
            })
            .await?;

        match outcome {
            TurnOutcome::Committed(answer) => {
                if self.json {
                    let output = serde_json::json!({
                        "answer": answer,
                        "model": config.model,
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    // Newline after the streamed text
                    println!();
                }
                Ok(())
            }
            TurnOutcome::EmptyCompletion => {
                tracing::warn!("Provider returned an empty completion");
                Ok(())
            }
            TurnOutcome::Failed { category } => {
                // The controller already appended the user-visible message
                if let Some(message) = controller.conversation().log().last() {
                    if self.json {
                        let output = serde_json::json!({ "error": category });
                        println!("{}", serde_json::to_string_pretty(&output)?);
                    } else {
                        println!("{}", message.content);
                    }
                }
                Err(AppError::Chat(format!("Turn failed ({})", category)))
            }
            TurnOutcome::Cancelled => {
                tracing::info!("Turn cancelled");
                Ok(())
            }
        }
    }

    /// Get the prompt text from the positional argument or a file.
    fn get_prompt(&self) -> Option<String> {
        self.prompt.clone().or_else(|| {
            self.file.as_ref().and_then(|path| {
                std::fs::read_to_string(path)
                    .map_err(|e| tracing::error!("Failed to read prompt file: {}", e))
                    .ok()
            })
        })
    }
}
