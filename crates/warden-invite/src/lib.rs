//! # warden-invite
//!
//! Invitation codes move through two states:
//!
//! ```text
//! Unused ──redeem(user)──▶ Used(user)
//! ```
//!
//! `Used` is terminal. Redemption is a single conditional write in the
//! Database, so under any number of concurrent attempts on one code exactly
//! one succeeds and the rest observe `AlreadyUsed`.

mod charset;
pub mod ledger;

pub use charset::{ALPHANUMERIC, Charset};
pub use ledger::InvitationLedger;
