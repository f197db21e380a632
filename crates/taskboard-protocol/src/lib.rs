//! Wire protocol for the Taskboard REST API.
//!
//! This crate defines the "language" the client speaks to the API:
//!
//! - **Types** ([`RequestSpec`], [`ApiResponse`], [`AuthPayload`], board
//!   and task bodies): what travels on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those bodies are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes over HTTP) → Protocol (typed bodies) → Dispatch (policy)
//! ```

mod board;
mod codec;
mod error;
mod types;

pub use board::{
    Board, BoardPatch, NewBoard, NewTask, PageMeta, StatusChange, Suggestion,
    SuggestionListBody, SuggestionRequest, Task, TaskListBody, TaskPage,
    TaskPatch,
};
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use taskboard_transport::Method;
pub use types::{
    ApiResponse, AuthPayload, Credentials, ErrorBody, Id, NestedAuth,
    RequestSpec, SignupRequest, User, AUTH_PATH_PREFIX,
};
