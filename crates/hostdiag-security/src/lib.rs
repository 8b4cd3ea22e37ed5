//! Allow-list binary resolution, ownership/permission verification, and
//! sanitized environment construction for external tool execution.

pub mod allowlist;
pub mod env;
pub mod error;

pub use allowlist::{resolve_binary, verify_binary, ALLOWED_DIRS};
pub use env::sanitize_env;
pub use error::{Result, SecurityError};
