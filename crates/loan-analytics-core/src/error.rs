use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoanAnalyticsError {
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    #[error("Row {row}: invalid {field} — {reason}")]
    RowValidation {
        row: usize,
        field: String,
        reason: String,
    },

    #[error("Invalid dimension '{0}': expected gender, account-type or customer-segment")]
    InvalidDimension(String),

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for LoanAnalyticsError {
    fn from(e: serde_json::Error) -> Self {
        LoanAnalyticsError::SerializationError(e.to_string())
    }
}
