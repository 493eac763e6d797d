use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a price rule adjusts the provider-quoted base price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleKind {
    /// Subtracts `value` percent of the base price.
    PercentageDiscount,
    /// Subtracts a flat amount, never below zero.
    FixedDiscount,
    /// Adds `value` percent of the base price.
    Markup,
}

/// Which class of caller a rule applies to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleScope {
    AllAgencies,
    SpecificAgency(String),
    AllCustomers,
}

/// Administrator-maintained price adjustment. Read-only to the pricing path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRule {
    pub id: Uuid,
    pub name: String,
    pub kind: RuleKind,
    pub value: f64,
    pub scope: RuleScope,
    pub hotel_code: Option<String>,
    pub board_type: Option<String>,
    /// Active window, inclusive of both bounds.
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub is_active: bool,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionKind {
    Percentage,
    Fixed,
}

/// Agency commission terms. Informational to the agency ledger; never
/// subtracted from the customer-facing price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commission {
    pub id: Uuid,
    pub agency_id: String,
    pub kind: CommissionKind,
    pub value: f64,
    pub hotel_code: Option<String>,
    pub board_type: Option<String>,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
