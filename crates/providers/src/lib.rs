pub mod openai_compat;
pub mod registry;
pub mod router;
pub mod traits;
pub(crate) mod util;

// Re-exports for convenience.
pub use registry::ProviderRegistry;
pub use router::LlmRouter;
pub use traits::{ChatRequest, ChatResponse, LlmProvider};
pub use util::resolve_api_key;
