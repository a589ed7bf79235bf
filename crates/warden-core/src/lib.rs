//! # warden-core
//!
//! Types shared by every Warden crate:
//!
//! - [`Role`] and [`CallerIdentity`], the authorization subject
//! - [`CallContext`], the per-call metadata, deadline and cancellation carrier
//! - Entities owned by the Database collaborator ([`entities`])
//! - The error taxonomy ([`Error`], [`StorageError`])
//! - Service configuration ([`config`])

pub mod config;
pub mod context;
pub mod entities;
pub mod error;
pub mod role;

pub use config::{
    AdminBootstrapConfig, DatabaseUrl, GateConfig, InvitationConfig, ServerConfig, TokenConfig,
    WardenConfig,
};
pub use context::{CallContext, OPERATOR_ID, OPERATOR_ROLE};
pub use entities::{
    AccountBlock, AdminRecord, InvitationCode, IpForbiddenEntry, LoginFailure, UserIpAllowEntry,
};
pub use error::{Error, Result, StorageError};
pub use role::{CallerIdentity, Role};
