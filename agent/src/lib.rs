pub mod agent;
pub mod backend;
pub mod config;
pub mod reply;
pub mod session;

pub use agent::{AgentError, ChatDispatcher, ChatReply, ChatRequest};
pub use backend::{AgentBackend, AgentCoreBackend, BedrockAgentBackend};
pub use config::{BackendConfig, ConfigError, DispatcherConfig, ImplementationType};
