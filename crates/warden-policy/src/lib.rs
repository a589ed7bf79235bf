//! Warden Permission Guard
//!
//! Authorization is decided from the caller identity that the transport placed
//! in the [`CallContext`](warden_core::CallContext) after parsing the session
//! token. No storage is consulted: every check reads only the per-call context
//! and is free of synchronization.
//!
//! Two entry points are offered for each rule:
//! - `require_*` resolves the identity from a context and checks it
//! - `check_*` checks an already-resolved [`CallerIdentity`](warden_core::CallerIdentity)

pub mod guard;

pub use guard::{
    check_admin, check_admin_or_self, check_user, identity, require_admin, require_admin_or_self,
    require_user,
};
