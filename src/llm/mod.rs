//! LLM integration module.
//!
//! Provides an OpenAI-compatible client for LLM API calls and
//! the prompt templates used for lineup, waiver and trade analysis.

mod client;
mod prompts;

pub use client::{LlmClient, Message, Recommender};
pub use prompts::{
    FreeAgentPrompt, PromptKind, PromptSet, PromptTemplate, PromptValues, SubstitutionPrompt,
    TradePrompt,
};
