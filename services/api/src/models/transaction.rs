//! Transaction model and related functionality

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Direction of a transaction. Amounts are always stored as magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown transaction type: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for TransactionKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

impl TryFrom<String> for TransactionKind {
    type Error = UnknownKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Transaction entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: i64,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type", try_from = "String")]
    pub kind: TransactionKind,
    pub category: String,
    pub date: NaiveDate,
    pub user_id: i64,
    pub is_recurring: bool,
    pub recurrence_day: Option<i32>,
    pub recurrence_active: bool,
}

impl Transaction {
    /// Re-check the record invariants, typically after a merge
    pub fn validate(&self) -> Result<(), String> {
        validate_fields(
            &self.description,
            self.amount,
            &self.category,
            self.is_recurring,
            self.recurrence_day,
        )
    }
}

fn default_true() -> bool {
    true
}

/// New transaction creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub is_recurring: bool,
    pub recurrence_day: Option<i32>,
    #[serde(default = "default_true")]
    pub recurrence_active: bool,
    /// Family member the record is created for; defaults to the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

impl NewTransaction {
    pub fn validate(&self) -> Result<(), String> {
        validate_fields(
            &self.description,
            self.amount,
            &self.category,
            self.is_recurring,
            self.recurrence_day,
        )
    }
}

/// Transaction update payload. Absent fields are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TransactionUpdate {
    pub description: Option<String>,
    pub amount: Option<f64>,
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub is_recurring: Option<bool>,
    pub recurrence_day: Option<i32>,
    pub recurrence_active: Option<bool>,
}

impl TransactionUpdate {
    pub const FIELDS: &'static [&'static str] = &[
        "description",
        "amount",
        "type",
        "category",
        "date",
        "is_recurring",
        "recurrence_day",
        "recurrence_active",
    ];

    pub fn merge_into(&self, tx: &mut Transaction) -> Vec<&'static str> {
        let mut applied = Vec::new();

        if let Some(description) = &self.description {
            tx.description = description.clone();
            applied.push("description");
        }
        if let Some(amount) = self.amount {
            tx.amount = amount;
            applied.push("amount");
        }
        if let Some(kind) = self.kind {
            tx.kind = kind;
            applied.push("type");
        }
        if let Some(category) = &self.category {
            tx.category = category.clone();
            applied.push("category");
        }
        if let Some(date) = self.date {
            tx.date = date;
            applied.push("date");
        }
        if let Some(is_recurring) = self.is_recurring {
            tx.is_recurring = is_recurring;
            applied.push("is_recurring");
        }
        if let Some(day) = self.recurrence_day {
            tx.recurrence_day = Some(day);
            applied.push("recurrence_day");
        }
        if let Some(active) = self.recurrence_active {
            tx.recurrence_active = active;
            applied.push("recurrence_active");
        }

        applied
    }
}

fn validate_fields(
    description: &str,
    amount: f64,
    category: &str,
    is_recurring: bool,
    recurrence_day: Option<i32>,
) -> Result<(), String> {
    if description.trim().is_empty() {
        return Err("Description is required".to_string());
    }
    if category.trim().is_empty() {
        return Err("Category is required".to_string());
    }
    if !amount.is_finite() || amount < 0.0 {
        return Err("Amount must be a non-negative number".to_string());
    }
    match (is_recurring, recurrence_day) {
        (true, None) => Err("Recurring transactions need a recurrence day".to_string()),
        (_, Some(day)) if !(1..=31).contains(&day) => {
            Err("Recurrence day must be between 1 and 31".to_string())
        }
        _ => Ok(()),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_serialized_as_type() {
        let tx = fixtures::tx(1, 10.0, TransactionKind::Expense, "Food", (2025, 1, 10));
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "expense");
        assert_eq!(json["date"], "2025-01-10");
    }

    #[test]
    fn recurring_without_day_is_rejected() {
        let mut tx = fixtures::tx(1, 10.0, TransactionKind::Expense, "Rent", (2025, 1, 1));
        tx.is_recurring = true;
        assert!(tx.validate().is_err());

        tx.recurrence_day = Some(31);
        assert!(tx.validate().is_ok());

        tx.recurrence_day = Some(32);
        assert!(tx.validate().is_err());
    }

    #[test]
    fn negative_amount_is_rejected() {
        let tx = fixtures::tx(1, -5.0, TransactionKind::Income, "Salary", (2025, 1, 1));
        assert_eq!(
            tx.validate().unwrap_err(),
            "Amount must be a non-negative number"
        );
    }

    #[test]
    fn merge_keeps_untouched_fields() {
        let mut tx = fixtures::tx(4, 99.0, TransactionKind::Expense, "Food", (2025, 3, 3));
        let update = TransactionUpdate {
            amount: Some(120.5),
            kind: Some(TransactionKind::Income),
            ..TransactionUpdate::default()
        };

        let applied = update.merge_into(&mut tx);

        assert_eq!(applied, vec!["amount", "type"]);
        assert_eq!(tx.amount, 120.5);
        assert_eq!(tx.kind, TransactionKind::Income);
        assert_eq!(tx.category, "Food");
        for field in applied {
            assert!(TransactionUpdate::FIELDS.contains(&field));
        }
    }

    #[test]
    fn new_transaction_defaults() {
        let payload: NewTransaction = serde_json::from_value(serde_json::json!({
            "description": "Lunch",
            "amount": 12.5,
            "type": "expense",
            "category": "Food",
            "date": "2025-02-01"
        }))
        .unwrap();

        assert!(!payload.is_recurring);
        assert!(payload.recurrence_active);
        assert!(payload.user_id.is_none());
        assert!(payload.validate().is_ok());
    }
}
