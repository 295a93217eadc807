// src/db/customer_repo.rs

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Executor};
use uuid::Uuid;

use crate::{
    common::error::{is_unique_violation, AppError},
    models::customer::{Customer, CustomerScope, CustomerSummary},
};

const CUSTOMER_COLUMNS: &str =
    "id, name, phone, identification, cobrador_id, user_id, balance, created_at";

// Filtro de visibilidade compartilhado com o repositório de movimentos.
// $1 = tipo do escopo, $2 = id do usuário
pub(crate) const SCOPE_FILTER: &str = r#"
    ($1 = 'ALL'
     OR ($1 = 'COLLECTOR' AND (c.cobrador_id IS NULL OR c.cobrador_id = $2))
     OR ($1 = 'OWN' AND c.user_id = $2))
"#;

// Busca literal por trecho do nome ("_" e "%" não são curingas). $3 = texto ou NULL
pub(crate) const NAME_FILTER: &str =
    "($3::text IS NULL OR strpos(lower(c.name), lower($3)) > 0)";

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(customer)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        phone: Option<&str>,
        identification: Option<&str>,
        cobrador_id: Option<Uuid>,
        user_id: Option<Uuid>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO customers (id, name, phone, identification, cobrador_id, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Customer>(&sql)
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(phone)
            .bind(identification)
            .bind(cobrador_id)
            .bind(user_id)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    return AppError::CustomerNameTaken;
                }
                e.into()
            })
    }

    /// Busca pelo nome ou cria o cliente no primeiro movimento.
    /// Atômico graças ao UNIQUE(name): duas requisições simultâneas caem na mesma linha.
    /// A carteira só é usada na criação; cliente existente mantém a sua.
    pub async fn find_or_create_by_name<'e, E>(
        &self,
        executor: E,
        name: &str,
        cobrador_id: Option<Uuid>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO customers (id, name, cobrador_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING {CUSTOMER_COLUMNS}
            "#
        );
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(cobrador_id)
            .fetch_one(executor)
            .await?;
        Ok(customer)
    }

    /// Aplica o delta ao saldo em cache e devolve o novo saldo.
    pub async fn apply_balance_delta<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        delta: Decimal,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let balance: Option<Decimal> = sqlx::query_scalar(
            "UPDATE customers SET balance = balance + $2 WHERE id = $1 RETURNING balance",
        )
        .bind(customer_id)
        .bind(delta)
        .fetch_optional(executor)
        .await?;

        balance.ok_or(AppError::CustomerNotFound)
    }

    pub async fn list_summaries(
        &self,
        scope: CustomerScope,
        search: Option<&str>,
    ) -> Result<Vec<CustomerSummary>, AppError> {
        let (scope_kind, scope_user) = scope.sql_params();
        let sql = format!(
            r#"
            SELECT
                c.id, c.name, c.phone,
                u.username AS cobrador_name,
                c.balance,
                COUNT(m.id) AS movement_count,
                MAX(m.movement_date) AS last_movement
            FROM customers c
            LEFT JOIN users u ON u.id = c.cobrador_id
            LEFT JOIN movements m ON m.customer_id = c.id
            WHERE {SCOPE_FILTER}
              AND {NAME_FILTER}
            GROUP BY c.id, u.username
            ORDER BY c.name ASC
            "#
        );
        let rows = sqlx::query_as::<_, CustomerSummary>(&sql)
            .bind(scope_kind)
            .bind(scope_user)
            .bind(search)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
