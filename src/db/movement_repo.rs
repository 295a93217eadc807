// src/db/movement_repo.rs

use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Executor};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::customer_repo::{NAME_FILTER, SCOPE_FILTER},
    models::{
        customer::CustomerScope,
        movement::{Movement, MovementListRow, NewMovement},
    },
};

const MOVEMENT_COLUMNS: &str =
    "id, customer_id, movement_date, description, kind, amount, recorded_by, created_at";

#[derive(Clone)]
pub struct MovementRepository {
    pool: PgPool,
}

impl MovementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        movement: &NewMovement,
        recorded_by: Option<Uuid>,
    ) -> Result<Movement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO movements (id, customer_id, movement_date, description, kind, amount, recorded_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {MOVEMENT_COLUMNS}
            "#
        );
        let inserted = sqlx::query_as::<_, Movement>(&sql)
            .bind(Uuid::new_v4())
            .bind(customer_id)
            .bind(movement.date)
            .bind(&movement.description)
            .bind(movement.kind)
            .bind(movement.amount)
            .bind(recorded_by)
            .fetch_one(executor)
            .await?;
        Ok(inserted)
    }

    /// Movimentos do cliente na ordem do extrato: data, depois ordem de inserção.
    pub async fn list_for_customer(
        &self,
        customer_id: Uuid,
        until: Option<NaiveDate>,
    ) -> Result<Vec<Movement>, AppError> {
        let sql = format!(
            r#"
            SELECT {MOVEMENT_COLUMNS}
            FROM movements
            WHERE customer_id = $1
              AND ($2::date IS NULL OR movement_date <= $2)
            ORDER BY movement_date ASC, created_at ASC, id ASC
            "#
        );
        let movements = sqlx::query_as::<_, Movement>(&sql)
            .bind(customer_id)
            .bind(until)
            .fetch_all(&self.pool)
            .await?;
        Ok(movements)
    }

    /// Listagem da tela principal, mais recentes primeiro.
    pub async fn search(
        &self,
        scope: CustomerScope,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MovementListRow>, AppError> {
        let (scope_kind, scope_user) = scope.sql_params();
        let sql = format!(
            r#"
            SELECT
                m.id, m.customer_id, c.name AS customer_name,
                m.movement_date, m.description, m.kind, m.amount,
                u.username AS recorded_by_name,
                m.created_at
            FROM movements m
            JOIN customers c ON c.id = m.customer_id
            LEFT JOIN users u ON u.id = m.recorded_by
            WHERE {SCOPE_FILTER}
              AND {NAME_FILTER}
            ORDER BY m.created_at DESC, m.id DESC
            LIMIT $4 OFFSET $5
            "#
        );
        let rows = sqlx::query_as::<_, MovementListRow>(&sql)
            .bind(scope_kind)
            .bind(scope_user)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn count(
        &self,
        scope: CustomerScope,
        search: Option<&str>,
    ) -> Result<i64, AppError> {
        let (scope_kind, scope_user) = scope.sql_params();
        let sql = format!(
            r#"
            SELECT COUNT(*)
            FROM movements m
            JOIN customers c ON c.id = m.customer_id
            WHERE {SCOPE_FILTER}
              AND {NAME_FILTER}
            "#
        );
        let total: i64 = sqlx::query_scalar(&sql)
            .bind(scope_kind)
            .bind(scope_user)
            .bind(search)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}
