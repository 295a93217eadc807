// src/services/auth.rs

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, Role, User},
    services::password::{hash_secret, verify_secret_blocking},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    AlreadyHasAdmin,
    Created,
    Restored,
    Skipped,
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    session_secret: String,
    session_ttl_hours: i64,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, session_secret: String, session_ttl_hours: i64) -> Self {
        Self { user_repo, session_secret, session_ttl_hours }
    }

    /// Valida usuário e senha. Usuário inexistente, senha errada ou usuário
    /// desativado devolvem o mesmo `InvalidCredentials`.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AppError> {
        let username = username.trim();
        let user = self.user_repo.find_by_username(username).await?;

        let stored_hash = user.as_ref().map(|u| u.password_hash.as_str());
        let is_password_valid = verify_secret_blocking(password, stored_hash).await?;

        match user {
            Some(user) if is_password_valid && user.active => {
                tracing::info!("🔑 Login de '{}' ({})", user.username, user.role.as_str());
                Ok(user)
            }
            Some(user) if is_password_valid => {
                tracing::warn!("Login recusado: usuário '{}' está desativado", user.username);
                Err(AppError::InvalidCredentials)
            }
            _ => {
                tracing::warn!("Login recusado para '{}'", username);
                Err(AppError::InvalidCredentials)
            }
        }
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decode_token(token)?;

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        // Usuário desativado perde a sessão na próxima requisição
        if !user.active {
            return Err(AppError::InvalidToken);
        }
        Ok(user)
    }

    pub fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.session_ttl_hours);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.session_secret.as_ref()),
        )?)
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.session_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }

    /// Garante um admin ativo na inicialização.
    pub async fn bootstrap_admin(
        &self,
        username: &str,
        password: Option<&str>,
    ) -> Result<BootstrapOutcome, AppError> {
        if self.user_repo.count_active_admins().await? > 0 {
            return Ok(BootstrapOutcome::AlreadyHasAdmin);
        }

        let Some(password) = password else {
            tracing::warn!(
                "⚠️ Nenhum admin ativo e DEFAULT_ADMIN_PASSWORD não definido; ninguém poderá administrar usuários."
            );
            return Ok(BootstrapOutcome::Skipped);
        };

        let hashed = hash_secret(password).await?;

        match self.user_repo.find_by_username(username).await? {
            Some(existing) => {
                self.user_repo.restore_admin(existing.id, &hashed).await?;
                tracing::info!("🛠️ Admin '{}' reativado com a senha padrão", username);
                Ok(BootstrapOutcome::Restored)
            }
            None => {
                self.user_repo
                    .create_user(self.user_repo.pool(), username, &hashed, Role::Admin)
                    .await?;
                tracing::info!("🛠️ Admin padrão '{}' criado", username);
                Ok(BootstrapOutcome::Created)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    // Pool preguiçoso: nunca conecta, serve só para montar o serviço
    fn service(secret: &str) -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/fiado_test")
            .unwrap();
        AuthService::new(UserRepository::new(pool), secret.to_string(), 12)
    }

    #[tokio::test]
    async fn token_round_trips_subject() {
        let auth = service("0123456789abcdef-secret");
        let user_id = Uuid::new_v4();

        let token = auth.create_token(user_id).unwrap();
        let claims = auth.decode_token(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let token = service("0123456789abcdef-secret").create_token(Uuid::new_v4()).unwrap();
        let other = service("another-secret-0123456789");

        assert!(matches!(other.decode_token(&token), Err(AppError::InvalidToken)));
        assert!(matches!(other.decode_token("lixo"), Err(AppError::InvalidToken)));
    }
}
