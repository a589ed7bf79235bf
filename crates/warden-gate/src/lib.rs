//! # warden-gate
//!
//! Admission control for login and registration.
//!
//! ## Login Rules
//!
//! Rules run in a fixed order and the first denial wins:
//!
//! | # | Rule | Denial |
//! |---|------|--------|
//! | 1 | IP is on the block list with `limit_login` | `ip forbidden` |
//! | 2 | User has an allow-list and this IP is not on it | `user ip forbidden` |
//! | 3 | Account is blocked | stored block reason |
//!
//! Network-level denial is shared by many users and short-circuits before any
//! per-user lookup. A user with no allow-list rows is unrestricted by rule 2.
//!
//! Reads are point-in-time and not linearized against concurrent admin edits.

pub mod admin;
pub mod gate;
pub mod login;
pub mod throttle;

pub use admin::BlockListAdmin;
pub use gate::{GateKeeper, LOGIN_RULES, LoginRule};
pub use login::{AdminAuthenticator, hash_password};
pub use throttle::LoginThrottle;
