pub mod endpoint_selector;
pub mod error;
pub mod identity_resolver;
pub mod integrity;
pub mod pipeline;
pub mod verifier;
