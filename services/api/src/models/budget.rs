//! Budget model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Spending limit for one category, owned by a family root account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Budget {
    pub id: i64,
    pub category: String,
    pub limit_amount: f64,
    pub user_id: i64,
}

/// New budget creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBudget {
    pub category: String,
    pub limit_amount: f64,
}

impl NewBudget {
    pub fn validate(&self) -> Result<(), String> {
        if self.category.trim().is_empty() {
            return Err("Category is required".to_string());
        }
        if !self.limit_amount.is_finite() || self.limit_amount < 0.0 {
            return Err("Limit must be a non-negative number".to_string());
        }
        Ok(())
    }
}

/// Budget update payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BudgetUpdate {
    pub category: Option<String>,
    pub limit_amount: Option<f64>,
}

impl BudgetUpdate {
    pub const FIELDS: &'static [&'static str] = &["category", "limit_amount"];

    pub fn merge_into(&self, budget: &mut Budget) -> Vec<&'static str> {
        let mut applied = Vec::new();
        if let Some(category) = &self.category {
            budget.category = category.clone();
            applied.push("category");
        }
        if let Some(limit) = self.limit_amount {
            budget.limit_amount = limit;
            applied.push("limit_amount");
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_updates_limit_only() {
        let mut budget = Budget {
            id: 1,
            category: "Food".to_string(),
            limit_amount: 150.0,
            user_id: 2,
        };
        let applied = BudgetUpdate {
            limit_amount: Some(300.0),
            ..BudgetUpdate::default()
        }
        .merge_into(&mut budget);

        assert_eq!(applied, vec!["limit_amount"]);
        assert_eq!(budget.limit_amount, 300.0);
        assert_eq!(budget.category, "Food");
    }

    #[test]
    fn blank_category_is_invalid() {
        let budget = NewBudget {
            category: "  ".to_string(),
            limit_amount: 10.0,
        };
        assert!(budget.validate().is_err());
    }
}
