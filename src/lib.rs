//! Chat front-end for hosted Langflow flows.
//!
//! A [`flow::FlowClient`] sends one question per request to a flow's run
//! endpoint and pulls the answer text out of the JSON reply. Each
//! [`session::ChatSession`] keeps its own append-only
//! [`conversation::ConversationStore`] of answered questions.

pub mod config;
pub mod conversation;
pub mod error;
pub mod events;
pub mod flow;
pub mod logging;
pub mod session;
pub mod ui;

pub use config::{Config, FlowProfile, FlowSettings};
pub use conversation::{ConversationEntry, ConversationStore};
pub use error::FlowError;
pub use flow::{FlowClient, FlowReply, NO_VALID_OUTPUTS, Tweaks};
pub use session::{AnsweredQuestion, ChatSession, PendingQuestion};
