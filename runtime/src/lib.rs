pub mod config;
pub mod document;
pub mod error;
pub mod itsm_agent;
pub mod knowledge_base;
pub mod model;
pub mod server;
pub mod tools;

pub use config::RuntimeConfig;
pub use error::RuntimeError;
pub use itsm_agent::{ItsmAgent, SYSTEM_PROMPT};
pub use knowledge_base::{BedrockKnowledgeBase, KnowledgeBase, Passage, UnconfiguredKnowledgeBase};
pub use model::{BedrockModel, ModelClient, ModelTurn};
pub use tools::ItsmTools;
