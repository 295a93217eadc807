// src/models/statement.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::{error::AppError, format::parse_optional_date},
    models::{customer::Customer, movement::MovementKind},
};

// Filtro de período do extrato (?from=&to=)
#[derive(Debug, Default, Deserialize)]
pub struct StatementQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatementRange {
    #[schema(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,
}

impl StatementRange {
    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

impl TryFrom<&StatementQuery> for StatementRange {
    type Error = AppError;

    fn try_from(query: &StatementQuery) -> Result<Self, Self::Error> {
        let from = parse_optional_date(query.from.as_deref())?;
        let to = parse_optional_date(query.to.as_deref())?;
        if let (Some(f), Some(t)) = (from, to) {
            if f > t {
                return Err(AppError::InvalidDateRange);
            }
        }
        Ok(StatementRange { from, to })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatementLine {
    pub movement_id: Uuid,
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub description: String,
    pub kind: MovementKind,
    #[schema(value_type = String, example = "40.00")]
    pub amount: Decimal,
    // Saldo acumulado depois deste movimento
    #[schema(value_type = String, example = "60.00")]
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    pub customer: Customer,
    pub range: StatementRange,
    // Saldo dos movimentos anteriores a `range.from`
    #[schema(value_type = String)]
    pub opening_balance: Decimal,
    pub lines: Vec<StatementLine>,
    #[schema(value_type = String)]
    pub total_purchases: Decimal,
    #[schema(value_type = String)]
    pub total_payments: Decimal,
    #[schema(value_type = String, example = "85.00")]
    pub final_balance: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_query_gives_open_range() {
        let query = StatementQuery { from: Some(String::new()), to: None };
        let range = StatementRange::try_from(&query).unwrap();
        assert!(range.is_open());
    }

    #[test]
    fn reversed_range_is_rejected() {
        let query = StatementQuery {
            from: Some("2024-02-01".into()),
            to: Some("2024-01-01".into()),
        };
        assert!(matches!(
            StatementRange::try_from(&query),
            Err(AppError::InvalidDateRange)
        ));
    }
}
