pub mod api_client;

// Re-export for convenience
pub use api_client::{ApiClient, ApiError, ChatBackend, FailureKind};
