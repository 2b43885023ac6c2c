//! Error types for loading and normalizing order history.

use thiserror::Error;

/// Result alias used by the parsing and output layers.
pub type Result<T> = std::result::Result<T, InsightsError>;

#[derive(Error, Debug)]
pub enum InsightsError {
    /// The payload is valid JSON but not an array of order objects.
    #[error("Invalid order payload: {0}")]
    Payload(String),

    /// A record carries an `order_time` that cannot be read as a timestamp.
    #[error("Record {index} has an unparseable order_time '{value}'")]
    InvalidOrderTime { index: usize, value: String },

    /// A record has no `order_time` at all.
    #[error("Record {index} is missing order_time")]
    MissingOrderTime { index: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl InsightsError {
    /// True for failures caused by a single bad record rather than by the
    /// transport or the payload shape.
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            InsightsError::InvalidOrderTime { .. } | InsightsError::MissingOrderTime { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_errors_are_classified() {
        let err = InsightsError::InvalidOrderTime {
            index: 3,
            value: "yesterday".to_string(),
        };
        assert!(err.is_record_error());
        assert_eq!(
            err.to_string(),
            "Record 3 has an unparseable order_time 'yesterday'"
        );

        assert!(InsightsError::MissingOrderTime { index: 0 }.is_record_error());
        assert!(!InsightsError::Payload("not an array".into()).is_record_error());
    }
}
