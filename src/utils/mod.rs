//! Utility modules shared by the gateway, the invoker and the registry.
//!
//! - [`HttpClient`]: shared HTTP connection pool
//! - [`StreamSession`], [`paced`]: paced streaming of a completed answer
//! - [`validate_url`] and friends: profile field validation

mod http;
mod streaming;
mod validate;

pub use http::HttpClient;
pub use streaming::{
    into_frames, paced, tokenize, CancelHandle, StreamChunk, StreamSession, StreamState,
    DONE_MARKER, ERROR_MARKER, PROCESSING_NOTICE,
};
pub use validate::{
    validate_command, validate_env_name, validate_server_name, validate_timeout, validate_url,
    ValidationError,
};
