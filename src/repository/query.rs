//! Row Queries
//!
//! Rows are JSON objects. Filters and ordering are described here once and
//! either rendered as request parameters (REST backend) or evaluated in
//! memory (SQLite backend).

use serde_json::{Map, Value};
use std::cmp::Ordering;

/// A backend row
pub type Row = Map<String, Value>;

/// One filter condition on a named column
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Eq { column: String, value: Value },
    In { column: String, values: Vec<Value> },
}

impl Clause {
    pub fn column(&self) -> &str {
        match self {
            Clause::Eq { column, .. } | Clause::In { column, .. } => column,
        }
    }

    fn matches(&self, row: &Row) -> bool {
        let Some(actual) = row.get(self.column()) else {
            return false;
        };
        match self {
            Clause::Eq { value, .. } => same_value(actual, value),
            Clause::In { values, .. } => values.iter().any(|v| same_value(actual, v)),
        }
    }
}

/// Conjunction of column conditions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `column == value`
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Eq {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// Require `column` to be one of `values`
    pub fn is_in<V: Into<Value>>(
        mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.clauses.push(Clause::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.clauses.iter().all(|c| c.matches(row))
    }
}

/// Single-column sort
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }

    /// Compare two rows on this column. Nulls sort last ascending and first
    /// descending, as the remote backend does.
    pub fn compare(&self, a: &Row, b: &Row) -> Ordering {
        let ordering = compare_values(a.get(&self.column), b.get(&self.column));
        if self.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

/// Text form of a value as it appears in a filter parameter
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn same_value(actual: &Value, expected: &Value) -> bool {
    actual == expected || (!actual.is_null() && value_text(actual) == value_text(expected))
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => value_text(x).cmp(&value_text(y)),
    }
}
