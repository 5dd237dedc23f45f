//! Reporting and analytics over an already-fetched list of transactions
//!
//! Everything here is pure. Callers load the owner-scoped rows and pass them in,
//! so the same functions serve every endpoint regardless of who is asking.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::models::{Budget, Transaction, TransactionKind};

/// Budgets at or above this share of their limit raise an alert
pub const BUDGET_ALERT_PERCENT: f64 = 80.0;
/// Legacy summary thresholds
pub const LEGACY_ALERT_PERCENT: f64 = 70.0;
pub const LEGACY_CRITICAL_PERCENT: f64 = 90.0;
/// Categories listed on each side of a period report
pub const TOP_CATEGORIES: usize = 5;

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the month containing `date`
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole * 100.0 } else { 0.0 }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub total: f64,
    pub quantidade: usize,
}

/// Totals, counts and averages over a list of transactions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionStats {
    pub total_receitas: f64,
    pub total_despesas: f64,
    pub saldo: f64,
    pub quantidade_transacoes: usize,
    pub quantidade_receitas: usize,
    pub quantidade_despesas: usize,
    pub media_receitas: f64,
    pub media_despesas: f64,
    pub por_categoria: BTreeMap<String, CategoryTotal>,
}

pub fn transaction_stats(transactions: &[Transaction]) -> TransactionStats {
    let mut stats = TransactionStats::default();

    for tx in transactions {
        match tx.kind {
            TransactionKind::Income => {
                stats.total_receitas += tx.amount;
                stats.quantidade_receitas += 1;
            }
            TransactionKind::Expense => {
                stats.total_despesas += tx.amount;
                stats.quantidade_despesas += 1;
            }
        }
        let entry = stats.por_categoria.entry(tx.category.clone()).or_default();
        entry.total += tx.amount;
        entry.quantidade += 1;
    }

    stats.quantidade_transacoes = transactions.len();
    stats.saldo = stats.total_receitas - stats.total_despesas;
    if stats.quantidade_receitas > 0 {
        stats.media_receitas = stats.total_receitas / stats.quantidade_receitas as f64;
    }
    if stats.quantidade_despesas > 0 {
        stats.media_despesas = stats.total_despesas / stats.quantidade_despesas as f64;
    }

    stats
}

/// Month-to-date consumption of one budget
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStatus {
    pub id: i64,
    pub category: String,
    pub limit_amount: f64,
    pub spent: f64,
    pub remaining: f64,
    pub percentage: f64,
    pub alert: bool,
    pub exceeded: bool,
}

/// Expenses of each budget's category from the first of `today`'s month
/// through `today`, compared against the plain limit
pub fn budget_status(
    budgets: &[Budget],
    transactions: &[Transaction],
    today: NaiveDate,
) -> Vec<BudgetStatus> {
    let from = month_start(today);

    budgets
        .iter()
        .map(|budget| {
            let category = budget.category.to_lowercase();
            let spent: f64 = transactions
                .iter()
                .filter(|tx| {
                    tx.kind == TransactionKind::Expense
                        && tx.date >= from
                        && tx.date <= today
                        && tx.category.to_lowercase() == category
                })
                .map(|tx| tx.amount)
                .sum();

            let percentage = percent_of(spent, budget.limit_amount);

            BudgetStatus {
                id: budget.id,
                category: budget.category.clone(),
                limit_amount: budget.limit_amount,
                spent,
                remaining: budget.limit_amount - spent,
                percentage: round1(percentage),
                alert: percentage >= BUDGET_ALERT_PERCENT,
                exceeded: percentage >= 100.0,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyBudgetLine {
    pub id: i64,
    pub category: String,
    /// Declared limit plus the category's income
    pub limit: f64,
    pub original_limit: f64,
    pub income_boost: f64,
    pub spent: f64,
    pub percentage: f64,
    pub alert: bool,
    pub critical: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacySummary {
    pub balance: f64,
    pub income: f64,
    pub expenses: f64,
    pub income_breakdown: BTreeMap<String, f64>,
    pub budgets: Vec<LegacyBudgetLine>,
}

/// Summary kept for old clients. Income in a budget's category raises that
/// budget's limit, and no date window is applied.
pub fn legacy_summary(budgets: &[Budget], transactions: &[Transaction]) -> LegacySummary {
    let mut income = 0.0;
    let mut expenses = 0.0;
    let mut income_breakdown = BTreeMap::new();

    for tx in transactions {
        match tx.kind {
            TransactionKind::Income => {
                income += tx.amount;
                *income_breakdown.entry(tx.category.clone()).or_insert(0.0) += tx.amount;
            }
            TransactionKind::Expense => expenses += tx.amount,
        }
    }

    let budgets = budgets
        .iter()
        .map(|budget| {
            let category = budget.category.to_lowercase();
            let (boost, spent) = transactions
                .iter()
                .filter(|tx| tx.category.to_lowercase() == category)
                .fold((0.0, 0.0), |(inc, exp), tx| match tx.kind {
                    TransactionKind::Income => (inc + tx.amount, exp),
                    TransactionKind::Expense => (inc, exp + tx.amount),
                });
            let limit = budget.limit_amount + boost;
            let percentage = percent_of(spent, limit);

            LegacyBudgetLine {
                id: budget.id,
                category: budget.category.clone(),
                limit,
                original_limit: budget.limit_amount,
                income_boost: boost,
                spent,
                percentage,
                alert: percentage >= LEGACY_ALERT_PERCENT,
                critical: percentage >= LEGACY_CRITICAL_PERCENT,
            }
        })
        .collect();

    LegacySummary {
        balance: income - expenses,
        income,
        expenses,
        income_breakdown,
        budgets,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub categoria: String,
    pub total: f64,
    pub quantidade: usize,
    pub percentual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAnalytics {
    /// `YYYY-MM`
    pub mes: String,
    pub total_despesas: f64,
    pub total_receitas: f64,
    pub despesas: Vec<CategoryShare>,
    pub receitas: Vec<CategoryShare>,
}

/// Per-category breakdown of the month containing `month`
pub fn category_analytics(transactions: &[Transaction], month: NaiveDate) -> CategoryAnalytics {
    let from = month_start(month);
    let to = month_end(month);
    let in_month: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| tx.date >= from && tx.date <= to)
        .collect();

    let side = |kind: TransactionKind| {
        let rows: Vec<&Transaction> = in_month.iter().copied().filter(|tx| tx.kind == kind).collect();
        let total: f64 = rows.iter().map(|tx| tx.amount).sum();
        let shares = ranked_categories(rows.into_iter())
            .into_iter()
            .map(|top| CategoryShare {
                percentual: round1(percent_of(top.total, total)),
                categoria: top.categoria,
                total: top.total,
                quantidade: top.quantidade,
            })
            .collect::<Vec<_>>();
        (total, shares)
    };

    let (total_despesas, despesas) = side(TransactionKind::Expense);
    let (total_receitas, receitas) = side(TransactionKind::Income);

    CategoryAnalytics {
        mes: from.format("%Y-%m").to_string(),
        total_despesas,
        total_receitas,
        despesas,
        receitas,
    }
}

/// Bucket size of a period report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    Dia,
    Semana,
    #[default]
    Mes,
}

impl Grouping {
    /// Sortable bucket key. Weeks use the ISO week-numbering year.
    pub fn key(&self, date: NaiveDate) -> String {
        match self {
            Grouping::Dia => date.format("%Y-%m-%d").to_string(),
            Grouping::Semana => {
                let week = date.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            Grouping::Mes => date.format("%Y-%m").to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodPoint {
    pub periodo: String,
    pub receitas: f64,
    pub despesas: f64,
    pub saldo: f64,
    pub quantidade: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCategory {
    pub categoria: String,
    pub total: f64,
    pub quantidade: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodReport {
    pub data_inicio: NaiveDate,
    pub data_fim: NaiveDate,
    pub agrupar_por: Grouping,
    pub estatisticas: TransactionStats,
    pub evolucao_temporal: Vec<PeriodPoint>,
    pub top_categorias_despesas: Vec<TopCategory>,
    pub top_categorias_receitas: Vec<TopCategory>,
    pub transacoes: Vec<Transaction>,
}

pub fn period_report(
    transactions: &[Transaction],
    from: NaiveDate,
    to: NaiveDate,
    grouping: Grouping,
) -> PeriodReport {
    let mut in_range: Vec<Transaction> = transactions
        .iter()
        .filter(|tx| tx.date >= from && tx.date <= to)
        .cloned()
        .collect();
    in_range.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

    let mut buckets: BTreeMap<String, PeriodPoint> = BTreeMap::new();
    for tx in &in_range {
        let key = grouping.key(tx.date);
        let point = buckets.entry(key.clone()).or_insert_with(|| PeriodPoint {
            periodo: key,
            ..PeriodPoint::default()
        });
        match tx.kind {
            TransactionKind::Income => point.receitas += tx.amount,
            TransactionKind::Expense => point.despesas += tx.amount,
        }
        point.saldo = point.receitas - point.despesas;
        point.quantidade += 1;
    }

    let top = |kind: TransactionKind| {
        let mut ranked = ranked_categories(in_range.iter().filter(|tx| tx.kind == kind));
        ranked.truncate(TOP_CATEGORIES);
        ranked
    };

    PeriodReport {
        data_inicio: from,
        data_fim: to,
        agrupar_por: grouping,
        estatisticas: transaction_stats(&in_range),
        evolucao_temporal: buckets.into_values().collect(),
        top_categorias_despesas: top(TransactionKind::Expense),
        top_categorias_receitas: top(TransactionKind::Income),
        transacoes: in_range,
    }
}

/// Categories by descending total, ties broken by name
fn ranked_categories<'a>(rows: impl Iterator<Item = &'a Transaction>) -> Vec<TopCategory> {
    let mut totals: HashMap<&str, (f64, usize)> = HashMap::new();
    for tx in rows {
        let entry = totals.entry(tx.category.as_str()).or_insert((0.0, 0));
        entry.0 += tx.amount;
        entry.1 += 1;
    }

    let mut ranked: Vec<TopCategory> = totals
        .into_iter()
        .map(|(categoria, (total, quantidade))| TopCategory {
            categoria: categoria.to_string(),
            total,
            quantidade,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.categoria.cmp(&b.categoria))
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transaction::fixtures::tx;
    use crate::models::TransactionKind::{Expense, Income};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn budget(category: &str, limit: f64) -> Budget {
        Budget {
            id: 1,
            category: category.to_string(),
            limit_amount: limit,
            user_id: 1,
        }
    }

    #[test]
    fn stats_example() {
        let rows = vec![
            tx(1, 1000.0, Income, "Salary", (2025, 1, 5)),
            tx(2, 200.0, Expense, "Food", (2025, 1, 10)),
        ];

        let stats = transaction_stats(&rows);

        assert_eq!(stats.total_receitas, 1000.0);
        assert_eq!(stats.total_despesas, 200.0);
        assert_eq!(stats.saldo, 800.0);
        assert_eq!(stats.quantidade_transacoes, 2);
        assert_eq!(stats.media_despesas, 200.0);
        assert_eq!(stats.por_categoria["Food"].quantidade, 1);
    }

    #[test]
    fn stats_of_nothing_are_zero() {
        let stats = transaction_stats(&[]);
        assert_eq!(stats, TransactionStats::default());
        assert_eq!(stats.media_receitas, 0.0);
        assert!(stats.por_categoria.is_empty());
    }

    #[test]
    fn overspent_budget() {
        let today = date(2025, 3, 20);
        let rows = vec![
            tx(1, 120.0, Expense, "Food", (2025, 3, 2)),
            tx(2, 80.0, Expense, "food", (2025, 3, 15)),
            // outside the month-to-date window
            tx(3, 500.0, Expense, "Food", (2025, 2, 28)),
            tx(4, 500.0, Expense, "Food", (2025, 3, 21)),
            tx(5, 999.0, Income, "Food", (2025, 3, 3)),
        ];

        let status = budget_status(&[budget("Food", 150.0)], &rows, today);

        assert_eq!(status[0].spent, 200.0);
        assert_eq!(status[0].percentage, 133.3);
        assert!(status[0].alert);
        assert!(status[0].exceeded);
        assert_eq!(status[0].remaining, -50.0);
    }

    #[test]
    fn zero_limit_budget_is_zero_percent() {
        let rows = vec![tx(1, 50.0, Expense, "Fun", (2025, 3, 2))];
        let status = budget_status(&[budget("Fun", 0.0)], &rows, date(2025, 3, 5));

        assert_eq!(status[0].percentage, 0.0);
        assert!(!status[0].alert);
        assert!(!status[0].exceeded);
    }

    #[test]
    fn budget_alert_threshold() {
        let rows = vec![tx(1, 80.0, Expense, "Fuel", (2025, 3, 1))];
        let status = budget_status(&[budget("Fuel", 100.0)], &rows, date(2025, 3, 1));

        assert!(status[0].alert);
        assert!(!status[0].exceeded);
    }

    #[test]
    fn legacy_summary_boosts_limits_with_income() {
        let rows = vec![
            tx(1, 100.0, Income, "Food", (2025, 1, 1)),
            tx(2, 180.0, Expense, "Food", (2025, 1, 2)),
            tx(3, 1000.0, Income, "Salary", (2025, 1, 3)),
        ];

        let summary = legacy_summary(&[budget("Food", 100.0)], &rows);
        let line = &summary.budgets[0];

        assert_eq!(summary.balance, 920.0);
        assert_eq!(summary.income_breakdown["Salary"], 1000.0);
        assert_eq!(line.limit, 200.0);
        assert_eq!(line.income_boost, 100.0);
        assert_eq!(line.percentage, 90.0);
        assert!(line.alert);
        assert!(line.critical);
    }

    #[test]
    fn category_analytics_sorts_and_shares() {
        let rows = vec![
            tx(1, 30.0, Expense, "Fun", (2025, 4, 1)),
            tx(2, 70.0, Expense, "Food", (2025, 4, 30)),
            tx(3, 999.0, Expense, "Food", (2025, 5, 1)),
            tx(4, 500.0, Income, "Salary", (2025, 4, 5)),
        ];

        let analytics = category_analytics(&rows, date(2025, 4, 17));

        assert_eq!(analytics.mes, "2025-04");
        assert_eq!(analytics.total_despesas, 100.0);
        assert_eq!(analytics.despesas[0].categoria, "Food");
        assert_eq!(analytics.despesas[0].percentual, 70.0);
        assert_eq!(analytics.despesas[1].categoria, "Fun");
        assert_eq!(analytics.receitas[0].percentual, 100.0);
    }

    #[test]
    fn weekly_keys_follow_iso_weeks() {
        assert_eq!(Grouping::Semana.key(date(2025, 1, 1)), "2025-W01");
        assert_eq!(Grouping::Semana.key(date(2024, 12, 30)), "2025-W01");
        assert_eq!(Grouping::Semana.key(date(2021, 1, 3)), "2020-W53");
        assert_eq!(Grouping::Dia.key(date(2025, 2, 9)), "2025-02-09");
        assert_eq!(Grouping::Mes.key(date(2025, 2, 9)), "2025-02");
    }

    #[test]
    fn period_report_series_and_top_categories() {
        let mut rows = vec![
            tx(1, 1000.0, Income, "Salary", (2025, 1, 5)),
            tx(2, 200.0, Expense, "Food", (2025, 1, 10)),
            tx(3, 50.0, Expense, "Fuel", (2025, 2, 1)),
            tx(4, 10.0, Expense, "Food", (2025, 3, 1)),
        ];
        for (i, cat) in ["A", "B", "C", "D", "E"].iter().enumerate() {
            rows.push(tx(10 + i as i64, 1.0 + i as f64, Expense, cat, (2025, 2, 2)));
        }

        let report = period_report(&rows, date(2025, 1, 1), date(2025, 2, 28), Grouping::Mes);

        assert_eq!(report.evolucao_temporal.len(), 2);
        assert_eq!(report.evolucao_temporal[0].periodo, "2025-01");
        assert_eq!(report.evolucao_temporal[0].saldo, 800.0);
        assert_eq!(report.evolucao_temporal[1].quantidade, 6);
        assert_eq!(report.top_categorias_despesas.len(), TOP_CATEGORIES);
        assert_eq!(report.top_categorias_despesas[0].categoria, "Food");
        assert_eq!(report.top_categorias_despesas[1].categoria, "Fuel");
        assert_eq!(report.top_categorias_receitas[0].total, 1000.0);
        assert_eq!(report.estatisticas.quantidade_transacoes, 8);
        assert!(report.transacoes.iter().all(|t| t.id != 4));
    }

    #[test]
    fn month_bounds() {
        assert_eq!(month_end(date(2024, 2, 10)), date(2024, 2, 29));
        assert_eq!(month_end(date(2025, 12, 31)), date(2025, 12, 31));
        assert_eq!(month_start(date(2025, 12, 31)), date(2025, 12, 1));
    }
}
