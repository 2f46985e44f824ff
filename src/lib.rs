//! Upload PDFs, keep their text in memory for a day, and ask questions about
//! them through an OpenRouter-compatible model API.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
