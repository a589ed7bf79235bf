//! # warden-token
//!
//! Session token handling for Warden.
//!
//! This crate provides functionality for:
//! - Issuing HS256-signed session tokens that encode a user id and role
//! - Parsing tokens back into a [`CallerIdentity`](warden_core::CallerIdentity)
//! - Classifying parse failures as malformed, expired, not yet valid, or unknown
//!
//! ## Token Model
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `sub` / `UserID` | Subject user id |
//! | `UserType` | Role (1 = normal, 2 = admin) |
//! | `PlatformID` | Discriminant; must be 0 for tokens accepted here |
//! | `iat` / `exp` / `nbf` | Validity window in Unix seconds |
//!
//! Tokens are stateless: nothing is persisted at issuance, and every parse
//! derives the claims fresh from the token itself.

pub mod claims;
pub mod clock;
pub mod service;

pub use claims::SessionClaims;
pub use clock::{Clock, FixedClock, SystemClock};
pub use service::{IssuedToken, NOT_BEFORE_SKEW, TokenService};
