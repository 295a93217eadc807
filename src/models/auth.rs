// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Mapeia o CREATE TYPE user_role do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Cobrador,
    Cliente,
    /// Papel legado das primeiras versões; equivale a um cobrador sem carteira.
    User,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Cobrador, Role::Cliente, Role::User];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Cobrador => "COBRADOR",
            Role::Cliente => "CLIENTE",
            Role::User => "USER",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Administrador",
            Role::Cobrador => "Cobrador",
            Role::Cliente => "Cliente",
            Role::User => "Usuario",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(value.trim()))
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    pub fn can_record_movements(self) -> bool {
        matches!(self, Role::Admin | Role::Cobrador | Role::User)
    }

    pub fn can_manage_customers(self) -> bool {
        matches!(self, Role::Admin | Role::Cobrador)
    }
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub role: Role,
    pub active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Formulário HTML de login
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// Dados para login pela API
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "admin")]
    pub username: String,
    #[validate(length(min = 1, message = "required"))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do token de sessão
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time
    pub iat: usize, // Issued At
}

// Criação de usuário pelo admin
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserForm {
    #[validate(length(min = 3, max = 60, message = "invalid_username"))]
    pub username: String,
    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,
    pub role: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordForm {
    #[validate(length(min = 6, message = "password_too_short"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordForm {
    pub current_password: String,
    #[validate(length(min = 6, message = "password_too_short"))]
    pub new_password: String,
    #[validate(must_match(other = "new_password", message = "password_mismatch"))]
    pub confirm_password: String,
}

// Recuperação do admin com o ADMIN_RESET_TOKEN
#[derive(Debug, Deserialize, Validate)]
pub struct AdminResetForm {
    pub token: String,
    #[validate(length(min = 1, message = "required"))]
    pub username: String,
    #[validate(length(min = 6, message = "password_too_short"))]
    pub new_password: String,
}
