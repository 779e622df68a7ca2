use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// A single validated loan record, one row of the uploaded book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRecord {
    pub loan_id: String,
    pub disbursed_amount: Money,
    /// Origination fee charged at disbursement
    #[serde(default)]
    pub setup_fee: Money,
    pub disbursement_date: NaiveDate,
    pub due_date: NaiveDate,
    /// Amount recovered to date
    pub recovered_amount: Money,
    pub outstanding_balance: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_segment: Option<String>,
}

impl LoanRecord {
    /// Balance implied by the disbursed/recovered pair. The recorded
    /// `outstanding_balance` is audited against this, never overwritten.
    pub fn implied_outstanding(&self) -> Money {
        self.disbursed_amount - self.recovered_amount
    }
}
