//! Filtered, sorted and paginated transaction search

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::{Transaction, TransactionKind};

const MAX_PAGE: usize = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Data,
    Valor,
    Categoria,
    Descricao,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

fn default_limit() -> usize {
    100
}

/// Search body. Every present criterion must match.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
    pub tipo: Option<TransactionKind>,
    pub categoria: Option<String>,
    pub valor_min: Option<f64>,
    pub valor_max: Option<f64>,
    pub busca: Option<String>,
    #[serde(default)]
    pub ordenar_por: SortField,
    #[serde(default)]
    pub ordem: SortOrder,
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            data_inicio: None,
            data_fim: None,
            tipo: None,
            categoria: None,
            valor_min: None,
            valor_max: None,
            busca: None,
            ordenar_por: SortField::default(),
            ordem: SortOrder::default(),
            skip: 0,
            limit: default_limit(),
        }
    }
}

impl SearchRequest {
    pub fn matches(&self, tx: &Transaction) -> bool {
        if self.data_inicio.is_some_and(|from| tx.date < from) {
            return false;
        }
        if self.data_fim.is_some_and(|to| tx.date > to) {
            return false;
        }
        if self.tipo.is_some_and(|kind| tx.kind != kind) {
            return false;
        }
        if self.valor_min.is_some_and(|min| tx.amount < min) {
            return false;
        }
        if self.valor_max.is_some_and(|max| tx.amount > max) {
            return false;
        }
        if let Some(category) = self.categoria.as_deref().filter(|c| !c.is_empty()) {
            if tx.category.to_lowercase() != category.to_lowercase() {
                return false;
            }
        }
        if let Some(needle) = self.busca.as_deref().filter(|b| !b.is_empty()) {
            if !tx.description.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        true
    }

    fn compare(&self, a: &Transaction, b: &Transaction) -> Ordering {
        let ordering = match self.ordenar_por {
            SortField::Data => a.date.cmp(&b.date),
            SortField::Valor => a.amount.total_cmp(&b.amount),
            SortField::Categoria => a.category.to_lowercase().cmp(&b.category.to_lowercase()),
            SortField::Descricao => a
                .description
                .to_lowercase()
                .cmp(&b.description.to_lowercase()),
        }
        .then(a.id.cmp(&b.id));

        match self.ordem {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// One page of results plus the total number of matches
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub total: usize,
    pub skip: usize,
    pub limit: usize,
    pub items: Vec<Transaction>,
}

pub fn search(transactions: Vec<Transaction>, request: &SearchRequest) -> SearchPage {
    let mut hits: Vec<Transaction> = transactions
        .into_iter()
        .filter(|tx| request.matches(tx))
        .collect();
    hits.sort_by(|a, b| request.compare(a, b));

    let limit = request.limit.min(MAX_PAGE);
    let total = hits.len();
    let items = hits.into_iter().skip(request.skip).take(limit).collect();

    SearchPage {
        total,
        skip: request.skip,
        limit,
        items,
    }
}
