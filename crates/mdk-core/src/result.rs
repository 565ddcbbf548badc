//! Result type alias for packing operations

use crate::error::PackError;

/// Standard Result type for packing operations
pub type Result<T> = std::result::Result<T, PackError>;
