use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::Message;

static PAGE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)page (\d+)").expect("page reference pattern is valid"));

/// Per-call overrides for the answer gateway. Unset fields fall back to the
/// configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub system_prompt: Option<String>,
}

impl AnswerOptions {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub citations: Vec<u64>,
    pub model_id: String,
    pub usage: Option<serde_json::Value>,
}

/// A single bounded request sent to the upstream completion provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: usize,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Completion {
    pub content: String,
    pub usage: Option<serde_json::Value>,
}

/// Distinct page numbers mentioned as "page N", in order of first mention.
pub fn extract_citations(text: &str) -> Vec<u64> {
    let mut pages = Vec::new();
    for captures in PAGE_REFERENCE.captures_iter(text) {
        let Some(page) = captures.get(1).and_then(|m| m.as_str().parse::<u64>().ok()) else {
            continue;
        };
        if !pages.contains(&page) {
            pages.push(page);
        }
    }
    pages
}

/// Returns at most the first `max_chars` characters of `text`.
pub fn take_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_citations_ordered_distinct() {
        let citations = extract_citations("See page 3 and page 10, also page 3.");
        assert_eq!(citations, vec![3, 10]);
    }

    #[test]
    fn test_extract_citations_case_insensitive() {
        let citations = extract_citations("PAGE 7 covers it, Page 2 too");
        assert_eq!(citations, vec![7, 2]);
    }

    #[test]
    fn test_extract_citations_requires_single_space() {
        assert!(extract_citations("pages 4 and page:5 and page  6").is_empty());
        assert!(extract_citations("no references here").is_empty());
    }

    #[test]
    fn test_take_chars_is_char_boundary_safe() {
        assert_eq!(take_chars("héllo", 2), "hé");
        assert_eq!(take_chars("abc", 10), "abc");
        assert_eq!(take_chars("", 3), "");
    }

    #[test]
    fn test_answer_options_camel_case() {
        let options: AnswerOptions =
            serde_json::from_str(r#"{"systemPrompt":"be brief","temperature":0.2}"#).unwrap();
        assert_eq!(options.system_prompt.as_deref(), Some("be brief"));
        assert_eq!(options.temperature, Some(0.2));
        assert!(options.model.is_none());
    }
}
