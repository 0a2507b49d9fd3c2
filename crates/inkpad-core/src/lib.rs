pub mod error;
pub mod id;
pub mod time;
pub mod validation;

pub use error::{CoreError, ErrorCategory, Result};
pub use id::{IdError, generate_id, parse_id};
pub use self::time::{Timestamp, now_utc};
pub use validation::{normalize_email, require_non_empty, sanitize_file_stem};
