// src/db/user_repo.rs

use sqlx::{PgPool, Postgres, Executor};
use uuid::Uuid;

use crate::{
    common::error::{is_unique_violation, AppError},
    models::auth::{Role, User},
};

const USER_COLUMNS: &str = "id, username, password_hash, role, active, created_at, updated_at";

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn list_all(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY active DESC, username ASC");
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn count_active_admins(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE role = 'ADMIN' AND active = TRUE",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    // Cria um novo usuário; aceita pool ou transação
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        username: &str,
        hashed_password: &str,
        role: Role,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO users (id, username, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(username)
            .bind(hashed_password)
            .bind(role)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                // Converte erro de violação de chave única em um erro mais amigável
                if is_unique_violation(&e) {
                    return AppError::UsernameTaken;
                }
                e.into()
            })
    }

    pub async fn update_password<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        hashed_password: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1",
        )
        .bind(user_id)
        .bind(hashed_password)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }

    // Recuperação: volta a ser admin ativo com a nova senha
    pub async fn restore_admin(&self, user_id: Uuid, hashed_password: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, role = 'ADMIN', active = TRUE, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(hashed_password)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_active<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        active: bool,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE users SET active = $2, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .bind(active)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::UserNotFound)
    }
}
