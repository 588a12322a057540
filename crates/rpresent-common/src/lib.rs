pub mod errors;
pub mod id;

pub use errors::{ConfigError, IndexError, RpresentError};
pub use id::{generate_key, new_correlation_id, KEY_CHARS, KEY_LEN};

pub type Result<T> = std::result::Result<T, RpresentError>;
