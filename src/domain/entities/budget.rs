//! Token budgeting for upstream completions.
//!
//! Token counts are estimated as one token per four characters, rounded up.
//! The response budget is whatever remains of the model's context window
//! after the estimated input and a fixed reserve, never less than one token.

use std::collections::HashMap;

pub const DEFAULT_CONTEXT_LIMIT: usize = 8000;
pub const RESERVE_TOKENS: usize = 1000;

pub fn estimate_tokens(char_count: usize) -> usize {
    char_count.div_ceil(4)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    pub max_context: usize,
    pub estimated_input: usize,
    pub reserve: usize,
}

impl TokenBudget {
    pub fn new(max_context: usize, estimated_input: usize, reserve: usize) -> Self {
        Self {
            max_context,
            estimated_input,
            reserve,
        }
    }

    /// Estimates the input from the pieces that make up the prompt.
    pub fn for_prompt(max_context: usize, reserve: usize, parts: &[&str]) -> Self {
        let chars = parts.iter().map(|p| p.chars().count()).sum();
        Self::new(max_context, estimate_tokens(chars), reserve)
    }

    pub fn max_response_tokens(&self) -> usize {
        self.max_context
            .saturating_sub(self.estimated_input)
            .saturating_sub(self.reserve)
            .max(1)
    }
}

/// Known context window sizes, keyed by model identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLimits {
    limits: HashMap<String, usize>,
    fallback: usize,
}

impl ModelLimits {
    pub fn new(limits: HashMap<String, usize>, fallback: usize) -> Self {
        Self { limits, fallback }
    }

    pub fn context_limit(&self, model: &str) -> usize {
        self.limits.get(model).copied().unwrap_or(self.fallback)
    }
}

impl Default for ModelLimits {
    fn default() -> Self {
        Self::new(HashMap::new(), DEFAULT_CONTEXT_LIMIT)
    }
}
