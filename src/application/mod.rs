//! Application layer - Use cases and orchestration.
//!
//! Services here depend on domain ports (traits) rather than concrete
//! implementations: ingestion, question answering, and the chat flow that
//! joins the two.

pub mod services;

pub use services::{AnswerGateway, ChatService, DocumentService};
