#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Typed client for OpenAI-style chat/completions APIs
//!
//! Supports buffered and streamed generation over the standard SSE wire
//! format, plus a function-calling loop that runs caller-supplied callbacks
//! when the model requests them and feeds their results back into the
//! conversation.
//!
//! ```no_run
//! use chatwire::{Client, RequestOptions};
//!
//! # async fn demo() -> chatwire::Result<()> {
//! let client = Client::from_env()?;
//! let answer = client
//!     .generate_text("2+2?", &RequestOptions::default())
//!     .await?;
//! assert_eq!(answer, "4");
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
pub mod error;
mod functions;
mod options;
pub mod protocol;
pub mod sse;
mod stream;

pub use client::{ChatPrompt, Client};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use functions::{CallableFunction, FunctionHandler};
pub use options::{DEFAULT_MODEL, RequestOptions};
pub use protocol::*;
pub use stream::ChunkStream;
