// src/services/user_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Role, User},
    services::password::{hash_secret, verify_secret_blocking},
};

// Gestão de usuários (admin) e troca da própria senha
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    pool: PgPool,
}

impl UserService {
    pub fn new(user_repo: UserRepository, pool: PgPool) -> Self {
        Self { user_repo, pool }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list_all().await
    }

    pub async fn create_user(
        &self,
        actor: &User,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let username = username.trim();
        let hashed_password = hash_secret(password).await?;

        let user = self
            .user_repo
            .create_user(&self.pool, username, &hashed_password, role)
            .await?;

        tracing::info!(
            "👤 Usuário '{}' ({}) criado por '{}'",
            user.username,
            role.as_str(),
            actor.username
        );
        Ok(user)
    }

    pub async fn toggle_active(&self, actor: &User, target_id: Uuid) -> Result<User, AppError> {
        if actor.id == target_id {
            return Err(AppError::CannotDeactivateSelf);
        }

        // Lê e grava na mesma transação para não inverter duas vezes
        let mut tx = self.pool.begin().await?;
        let current: bool = sqlx::query_scalar("SELECT active FROM users WHERE id = $1 FOR UPDATE")
            .bind(target_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let user = self.user_repo.set_active(&mut *tx, target_id, !current).await?;
        tx.commit().await?;

        tracing::info!(
            "👤 Usuário '{}' {} por '{}'",
            user.username,
            if user.active { "ativado" } else { "desativado" },
            actor.username
        );
        Ok(user)
    }

    pub async fn reset_password(
        &self,
        actor: &User,
        target_id: Uuid,
        new_password: &str,
    ) -> Result<(), AppError> {
        let hashed = hash_secret(new_password).await?;
        self.user_repo.update_password(&self.pool, target_id, &hashed).await?;
        tracing::info!("🔐 Senha do usuário {} redefinida por '{}'", target_id, actor.username);
        Ok(())
    }

    pub async fn change_own_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let valid = verify_secret_blocking(current_password, Some(&user.password_hash)).await?;
        if !valid {
            return Err(AppError::WrongCurrentPassword);
        }

        let hashed = hash_secret(new_password).await?;
        self.user_repo.update_password(&self.pool, user.id, &hashed).await?;
        tracing::info!("🔐 '{}' trocou a própria senha", user.username);
        Ok(())
    }

    /// Recuperação de acesso com o ADMIN_RESET_TOKEN. Só vale para admins.
    pub async fn reset_admin_with_token(
        &self,
        configured_token: Option<&str>,
        presented_token: &str,
        username: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let Some(expected) = configured_token else {
            return Err(AppError::ResetDisabled);
        };
        if !tokens_match(expected, presented_token.trim()) {
            tracing::warn!("Tentativa de recuperação de admin com token inválido");
            return Err(AppError::Forbidden);
        }

        let user = self
            .user_repo
            .find_by_username(username.trim())
            .await?
            .filter(|u| u.role.is_admin())
            .ok_or(AppError::UserNotFound)?;

        let hashed = hash_secret(new_password).await?;
        self.user_repo.restore_admin(user.id, &hashed).await?;
        tracing::warn!("🛠️ Senha do admin '{}' redefinida via token de recuperação", user.username);
        Ok(())
    }
}

// Comparação sem saída antecipada
fn tokens_match(expected: &str, presented: &str) -> bool {
    let (a, b) = (expected.as_bytes(), presented.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_comparison() {
        assert!(tokens_match("abc123", "abc123"));
        assert!(!tokens_match("abc123", "abc124"));
        assert!(!tokens_match("abc123", "abc12"));
        assert!(!tokens_match("abc123", ""));
    }
}
