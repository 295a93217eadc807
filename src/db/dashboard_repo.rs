// src/db/dashboard_repo.rs

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::dashboard::{DashboardSummary, DebtorEntry},
};

const TOP_DEBTORS: i64 = 5;

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_summary(&self) -> Result<DashboardSummary, AppError> {
        // Iniciamos uma transação (Snapshot consistente dos dados)
        let mut tx = self.pool.begin().await?;

        // A. Clientes e dívida em aberto (saldo em cache)
        let (customers_count, customers_with_debt, outstanding_total): (i64, i64, Decimal) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COUNT(*) FILTER (WHERE balance > 0),
                    COALESCE(SUM(balance) FILTER (WHERE balance > 0), 0)
                FROM customers
                "#,
            )
            .fetch_one(&mut *tx)
            .await?;

        // B. Compras e abonos do mês corrente
        let (purchases_this_month, payments_this_month): (Decimal, Decimal) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(amount) FILTER (WHERE kind = 'COMPRA'), 0),
                COALESCE(SUM(amount) FILTER (WHERE kind = 'ABONO'), 0)
            FROM movements
            WHERE movement_date >= date_trunc('month', CURRENT_DATE)::date
            "#,
        )
        .fetch_one(&mut *tx)
        .await?;

        // C. Movimentos lançados hoje
        let movements_today: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM movements WHERE created_at::date = CURRENT_DATE",
        )
        .fetch_one(&mut *tx)
        .await?;

        // D. Usuários ativos
        let active_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE active = TRUE")
            .fetch_one(&mut *tx)
            .await?;

        // E. Maiores devedores
        let top_debtors = sqlx::query_as::<_, DebtorEntry>(
            r#"
            SELECT id AS customer_id, name, balance
            FROM customers
            WHERE balance > 0
            ORDER BY balance DESC, name ASC
            LIMIT $1
            "#,
        )
        .bind(TOP_DEBTORS)
        .fetch_all(&mut *tx)
        .await?;

        // Commit ou rollback tanto faz pra leitura, mas commit é clean
        tx.commit().await?;

        Ok(DashboardSummary {
            customers_count,
            customers_with_debt,
            outstanding_total,
            purchases_this_month,
            payments_this_month,
            movements_today,
            active_users,
            top_debtors,
        })
    }
}
