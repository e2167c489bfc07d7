//! Error types for configuration rejected at the API boundary.
//!
//! The per-tick path never fails; only construction does.

use thiserror::Error;

/// Degenerate inputs that would produce an invalid grid, capsule or projectile.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Grid is too small to hold a border, an exit and its entry corridor.
    #[error("Grid {width}x{depth} is too small (minimum {min}x{min})")]
    GridTooSmall { width: usize, depth: usize, min: usize },

    /// A size, radius or speed that must be strictly positive.
    #[error("'{field}' must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },

    /// NaN or infinite component.
    #[error("'{field}' must be finite")]
    NonFinite { field: &'static str },

    /// A tunable outside its allowed interval.
    #[error("'{field}' = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    /// Fire direction has no length.
    #[error("Fire direction must be non-zero")]
    ZeroDirection,

    /// Settings file could not be read.
    #[error("Failed to read '{path}': {details}")]
    Io { path: String, details: String },

    /// Settings JSON could not be parsed.
    #[error("Parse error: {details}")]
    Parse { details: String },
}

/// Reject a value that is not finite or not strictly positive.
pub(crate) fn ensure_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite { field });
    }
    if value <= 0.0 {
        return Err(ConfigError::NonPositive { field, value });
    }
    Ok(())
}

/// Reject a value outside `[min, max]` (NaN included).
pub(crate) fn ensure_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite { field });
    }
    if value < min || value > max {
        return Err(ConfigError::OutOfRange { field, value, min, max });
    }
    Ok(())
}
