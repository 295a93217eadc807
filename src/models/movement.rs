// src/models/movement.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::{
    error::AppError,
    format::{check_amount, parse_amount, parse_date},
};

// Mapeia o CREATE TYPE movement_kind do banco.
// COMPRA aumenta a dívida do cliente, ABONO diminui.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "movement_kind")]
pub enum MovementKind {
    #[sqlx(rename = "COMPRA")]
    #[serde(rename = "COMPRA")]
    Purchase,
    #[sqlx(rename = "ABONO")]
    #[serde(rename = "ABONO")]
    Payment,
}

impl MovementKind {
    pub fn code(self) -> &'static str {
        match self {
            MovementKind::Purchase => "COMPRA",
            MovementKind::Payment => "ABONO",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MovementKind::Purchase => "Compra",
            MovementKind::Payment => "Abono",
        }
    }

    /// Aceita o código do formulário e os rótulos das versões antigas ("Pago").
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "COMPRA" => Some(MovementKind::Purchase),
            "ABONO" | "PAGO" => Some(MovementKind::Payment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: Uuid,
    pub customer_id: Uuid,

    #[schema(value_type = String, format = Date, example = "2024-01-05")]
    pub movement_date: NaiveDate,

    #[schema(example = "Almuerzo")]
    pub description: String,
    pub kind: MovementKind,

    #[schema(value_type = String, example = "40.00")]
    pub amount: Decimal,

    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// Linha da listagem da tela principal (com nomes já resolvidos)
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MovementListRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub movement_date: NaiveDate,
    pub description: String,
    pub kind: MovementKind,
    pub amount: Decimal,
    pub recorded_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Movimento já validado, pronto para gravar.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovement {
    pub customer_name: String,
    pub date: NaiveDate,
    pub description: String,
    pub kind: MovementKind,
    pub amount: Decimal,
}

// Formulário HTML: tudo chega como texto
#[derive(Debug, Deserialize, Validate)]
pub struct NewMovementForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 120, message = "invalid_customer"))]
    pub customer: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    #[validate(length(max = 200, message = "invalid_description"))]
    pub description: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub amount: String,
}

impl NewMovementForm {
    pub fn parse(self) -> Result<NewMovement, AppError> {
        let customer_name = self.customer.trim().to_string();
        let description = self.description.trim().to_string();
        if customer_name.is_empty() {
            return Err(AppError::MissingCustomer);
        }
        self.validate()?;

        let kind = MovementKind::parse(&self.kind).ok_or(AppError::InvalidMovementKind)?;
        let date = parse_date(&self.date)?;
        let amount = parse_amount(&self.amount)?;

        Ok(NewMovement { customer_name, date, description, kind, amount })
    }
}

// Payload da API JSON
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMovementPayload {
    #[validate(length(min = 1, max = 120, message = "invalid_customer"))]
    #[schema(example = "María Rodríguez")]
    pub customer: String,

    #[schema(value_type = String, format = Date, example = "2024-01-05")]
    pub date: NaiveDate,

    #[serde(default)]
    #[validate(length(max = 200, message = "invalid_description"))]
    pub description: String,

    pub kind: MovementKind,

    #[schema(value_type = String, example = "40.00")]
    pub amount: Decimal,
}

impl CreateMovementPayload {
    pub fn parse(self) -> Result<NewMovement, AppError> {
        self.validate()?;
        let customer_name = self.customer.trim().to_string();
        if customer_name.is_empty() {
            return Err(AppError::MissingCustomer);
        }
        Ok(NewMovement {
            customer_name,
            date: self.date,
            description: self.description.trim().to_string(),
            kind: self.kind,
            amount: check_amount(self.amount)?,
        })
    }
}

pub const PAGE_SIZE: u32 = 20;

#[derive(Debug, Default, Deserialize)]
pub struct MovementQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
}

impl MovementQuery {
    pub fn search(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Paginação 1-based da listagem de movimentos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
    pub total_items: i64,
}

impl Page {
    pub fn new(requested: Option<u32>, size: u32, total_items: i64) -> Self {
        let mut page = Page { number: 1, size: size.max(1), total_items: total_items.max(0) };
        page.number = requested.unwrap_or(1).clamp(1, page.total_pages());
        page
    }

    pub fn total_pages(&self) -> u32 {
        let pages = (self.total_items + i64::from(self.size) - 1) / i64::from(self.size);
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    pub fn has_prev(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(amount: &str, date: &str, kind: &str) -> NewMovementForm {
        NewMovementForm {
            customer: "  Ana Solís ".into(),
            date: date.into(),
            description: " Almuerzo ".into(),
            kind: kind.into(),
            amount: amount.into(),
        }
    }

    #[test]
    fn parses_a_valid_form() {
        let parsed = form("2,500", "2024-01-05", "COMPRA").parse().unwrap();
        assert_eq!(parsed.customer_name, "Ana Solís");
        assert_eq!(parsed.description, "Almuerzo");
        assert_eq!(parsed.kind, MovementKind::Purchase);
        assert_eq!(parsed.amount, Decimal::new(2500, 0));
        assert_eq!(parsed.date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    }

    #[test]
    fn rejects_malformed_input_with_specific_errors() {
        assert!(matches!(form("abc", "2024-01-05", "COMPRA").parse(), Err(AppError::InvalidAmount)));
        assert!(matches!(form("10", "05-2024", "COMPRA").parse(), Err(AppError::InvalidDate)));
        assert!(matches!(form("10", "2024-01-05", "REGALO").parse(), Err(AppError::InvalidMovementKind)));

        let mut empty = form("10", "2024-01-05", "ABONO");
        empty.customer = "   ".into();
        assert!(matches!(empty.parse(), Err(AppError::MissingCustomer)));
    }

    #[test]
    fn legacy_payment_label_is_accepted() {
        assert_eq!(MovementKind::parse("Pago"), Some(MovementKind::Payment));
        assert_eq!(MovementKind::parse("abono"), Some(MovementKind::Payment));
        assert_eq!(MovementKind::parse("Compra"), Some(MovementKind::Purchase));
    }

    #[test]
    fn page_is_clamped_to_available_range() {
        let page = Page::new(Some(9), 20, 45);
        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.number, 3);
        assert_eq!(page.offset(), 40);
        assert!(page.has_prev());
        assert!(!page.has_next());

        let empty = Page::new(Some(0), 20, 0);
        assert_eq!(empty.number, 1);
        assert_eq!(empty.total_pages(), 1);
        assert_eq!(empty.offset(), 0);
        assert!(!empty.has_next());
    }
}
