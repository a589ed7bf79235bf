pub mod context;

pub use context::{ClientIp, attach_context, require_session};
