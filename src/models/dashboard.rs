// src/models/dashboard.rs

use serde::Serialize;
use rust_decimal::Decimal;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Os cards do topo do painel do admin
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub customers_count: i64,
    pub customers_with_debt: i64,
    #[schema(value_type = String)]
    pub outstanding_total: Decimal,   // Soma dos saldos positivos
    #[schema(value_type = String)]
    pub purchases_this_month: Decimal,
    #[schema(value_type = String)]
    pub payments_this_month: Decimal,
    pub movements_today: i64,
    pub active_users: i64,
    pub top_debtors: Vec<DebtorEntry>,
}

// Ranking dos maiores saldos devedores
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DebtorEntry {
    pub customer_id: Uuid,
    pub name: String,
    #[schema(value_type = String)]
    pub balance: Decimal,
}
