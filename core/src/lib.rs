//! Session-aware API client core for the todo service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). A `Transport` executes the
//! round trip; `UreqTransport` is the blocking implementation used by the
//! CLI and the integration tests.
//!
//! # Design
//! - `TodoClient` is stateless: it holds only `base_url` and borrows the
//!   `Session` per request to attach the bearer credential.
//! - `TodoApp` owns the session, the durable `CredentialStore` and the
//!   declarative `View` a front end renders.
//! - Every failure is an `ApiError` carrying a presentable message.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod app;
pub mod client;
pub mod error;
pub mod http;
pub mod session;
pub mod transport;
pub mod types;
pub mod validate;

pub use app::{AuthView, Feed, FormState, TodoApp, View};
pub use client::TodoClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
pub use session::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, Session, StoredCredential, User,
};
pub use transport::{Transport, UreqTransport};
pub use types::{CreateTodo, RegisteredUser, Todo, UpdateTodo};
