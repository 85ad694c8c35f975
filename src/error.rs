//! Configuration errors
//!
//! The simulation itself has no I/O, so the only failures it reports are bad
//! tuning values caught when an entity, gate or session is created.

/// Rejected configuration value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Value must be strictly positive (radii, max health, frame duration).
    #[error("{what} must be greater than zero (got {value})")]
    NonPositive { what: &'static str, value: f32 },

    /// Value must not be negative (cooldowns, damage, speeds, shields).
    #[error("{what} must not be negative (got {value})")]
    Negative { what: &'static str, value: f32 },

    /// NaN or infinity where a real number is required.
    #[error("{what} must be a finite number")]
    NotFinite { what: &'static str },

    /// Value outside an allowed range.
    #[error("{what} must be within {min}..={max} (got {value})")]
    OutOfRange {
        what: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    /// Tuning document could not be parsed.
    #[error("invalid tuning document: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Require a finite value strictly greater than zero.
pub fn positive(what: &'static str, value: f32) -> Result<f32, ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { what });
    }
    if value <= 0.0 {
        return Err(ConfigError::NonPositive { what, value });
    }
    Ok(value)
}

/// Require a finite value that is zero or greater.
pub fn non_negative(what: &'static str, value: f32) -> Result<f32, ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { what });
    }
    if value < 0.0 {
        return Err(ConfigError::Negative { what, value });
    }
    Ok(value)
}

/// Require a finite value inside `min..=max`.
pub fn within(what: &'static str, value: f32, min: f32, max: f32) -> Result<f32, ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { what });
    }
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            what,
            value,
            min,
            max,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_rejects_zero_and_nan() {
        assert_eq!(
            positive("radius", 0.0),
            Err(ConfigError::NonPositive {
                what: "radius",
                value: 0.0
            })
        );
        assert_eq!(
            positive("radius", f32::NAN),
            Err(ConfigError::NotFinite { what: "radius" })
        );
        assert_eq!(positive("radius", 12.0), Ok(12.0));
    }

    #[test]
    fn test_non_negative_allows_zero() {
        assert_eq!(non_negative("cooldown", 0.0), Ok(0.0));
        assert!(matches!(
            non_negative("cooldown", -1.0),
            Err(ConfigError::Negative { .. })
        ));
    }

    #[test]
    fn test_error_messages_name_the_field() {
        let err = positive("enemy radius", -3.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "enemy radius must be greater than zero (got -3)"
        );
    }
}
