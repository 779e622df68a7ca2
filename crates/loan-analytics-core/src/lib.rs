pub mod analytics;
pub mod error;
pub mod record;
pub mod types;

pub use error::LoanAnalyticsError;
pub use types::*;

/// Standard result type for all loan-analytics operations
pub type LoanAnalyticsResult<T> = Result<T, LoanAnalyticsError>;
