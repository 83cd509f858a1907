pub mod ai;
pub mod provider;
pub mod providers;

pub use ai::{strip_code_fence, AiError, AiProvider, ChatAiProvider};
pub use provider::{LlmError, LlmProvider, Message, Role};
pub use providers::create_provider;
