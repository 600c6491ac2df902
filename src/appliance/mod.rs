//! Appliance access layer
//!
//! - [`http`] - request execution, API version and auth headers, error bodies
//! - [`auth`] - login sessions and the EULA handshake
//! - [`client`] - [`OneViewClient`], which ties the session, the transport and
//!   the task poller together for the facades

pub mod auth;
pub mod client;
pub mod http;

pub use auth::{Credentials, Session, DEFAULT_LOGIN_DOMAIN};
pub use client::{Follow, OneViewClient, Outcome, Submitted};
pub use http::{format_api_error, ApiError, HttpSettings, RequestOptions};
