//! Incremental construction of filtered statements.
//!
//! SQL fragments are `&'static str`, so only compile-time text ever reaches
//! the statement; every runtime value becomes a `$n` parameter.

use snipstore_core::types::{SqlParam, Statement};

/// Builds `<base> [WHERE a AND b ...] [ORDER BY ...]`.
#[derive(Debug, Clone)]
pub struct StatementBuilder {
    base: &'static str,
    conditions: Vec<String>,
    params: Vec<SqlParam>,
    order_by: Option<&'static str>,
}

impl StatementBuilder {
    /// Start from a statement without a `WHERE` clause.
    pub fn new(base: &'static str) -> Self {
        Self {
            base,
            conditions: Vec::new(),
            params: Vec::new(),
            order_by: None,
        }
    }

    /// Add `<expr> = $n` bound to `value`.
    pub fn where_eq(mut self, expr: &'static str, value: impl Into<SqlParam>) -> Self {
        self.params.push(value.into());
        self.conditions
            .push(format!("{expr} = ${}", self.params.len()));
        self
    }

    /// Add `<expr> IS NULL`.
    pub fn where_null(mut self, expr: &'static str) -> Self {
        self.conditions.push(format!("{expr} IS NULL"));
        self
    }

    /// Set the `ORDER BY` list.
    pub fn order_by(mut self, columns: &'static str) -> Self {
        self.order_by = Some(columns);
        self
    }

    /// Finish the statement.
    pub fn build(self) -> Statement {
        let mut sql = self.base.to_string();
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }
        if let Some(order) = self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        Statement {
            sql,
            params: self.params,
        }
    }
}
