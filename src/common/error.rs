use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::middleware::flash::Notice;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Sessão inválida ou expirada")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Cliente não encontrado")]
    CustomerNotFound,

    #[error("Nome de usuário já existe")]
    UsernameTaken,

    #[error("Cliente já existe")]
    CustomerNameTaken,

    #[error("Valor inválido")]
    InvalidAmount,

    #[error("Data inválida")]
    InvalidDate,

    #[error("Período inválido")]
    InvalidDateRange,

    #[error("Tipo de movimento inválido")]
    InvalidMovementKind,

    #[error("Cliente não informado")]
    MissingCustomer,

    #[error("Papel inválido")]
    InvalidRole,

    #[error("Cobrador inexistente: {0}")]
    UnknownCobrador(String),

    #[error("Login de cliente inexistente: {0}")]
    UnknownClientLogin(String),

    #[error("Senha atual incorreta")]
    WrongCurrentPassword,

    #[error("Não é possível desativar o próprio usuário")]
    CannotDeactivateSelf,

    #[error("Recuperação de admin desativada")]
    ResetDisabled,

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro gerando CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Erro de template: {0}")]
    TemplateError(#[from] askama::Error),

    #[error("Erro gerando PDF: {0}")]
    PdfError(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),
}

impl AppError {
    /// Erros que não são culpa do usuário; logados como error!.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::DatabaseError(_)
                | AppError::InternalServerError(_)
                | AppError::BcryptError(_)
                | AppError::JwtError(_)
                | AppError::CsvError(_)
                | AppError::TemplateError(_)
                | AppError::PdfError(_)
                | AppError::FontNotFound(_)
        )
    }

    /// Aviso mostrado ao usuário nas páginas HTML.
    pub fn notice(&self) -> Notice {
        match self {
            AppError::ValidationError(_) => Notice::InvalidForm,
            AppError::InvalidCredentials | AppError::UserNotFound => Notice::BadCredentials,
            AppError::InvalidToken => Notice::SessionExpired,
            AppError::Forbidden => Notice::Forbidden,
            AppError::CustomerNotFound => Notice::CustomerNotFound,
            AppError::UsernameTaken => Notice::UsernameTaken,
            AppError::CustomerNameTaken => Notice::CustomerExists,
            AppError::InvalidAmount => Notice::InvalidAmount,
            AppError::InvalidDate | AppError::InvalidDateRange => Notice::InvalidDate,
            AppError::InvalidMovementKind => Notice::InvalidKind,
            AppError::MissingCustomer => Notice::MissingCustomer,
            AppError::InvalidRole => Notice::InvalidForm,
            AppError::UnknownCobrador(_) => Notice::UnknownCobrador,
            AppError::UnknownClientLogin(_) => Notice::UnknownClientLogin,
            AppError::WrongCurrentPassword => Notice::WrongCurrentPassword,
            AppError::CannotDeactivateSelf => Notice::CannotDeactivateSelf,
            AppError::ResetDisabled => Notice::ResetTokenInvalid,
            AppError::PdfError(_) | AppError::FontNotFound(_) | AppError::CsvError(_) => {
                Notice::ExportFailed
            }
            _ => Notice::InternalError,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidAmount
            | AppError::InvalidDate
            | AppError::InvalidDateRange
            | AppError::InvalidMovementKind
            | AppError::MissingCustomer
            | AppError::InvalidRole
            | AppError::UnknownCobrador(_)
            | AppError::UnknownClientLogin(_)
            | AppError::WrongCurrentPassword
            | AppError::CannotDeactivateSelf => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::CustomerNotFound | AppError::ResetDisabled => {
                StatusCode::NOT_FOUND
            }
            AppError::UsernameTaken | AppError::CustomerNameTaken => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Resposta JSON da API. As páginas HTML usam `notice()` + redirect.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let AppError::ValidationError(errors) = &self {
            let mut details = std::collections::HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<String> = field_errors.iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .collect();
                details.insert(field.to_string(), messages);
            }
            let body = Json(json!({
                "error": "Um ou mais campos são inválidos.",
                "details": details,
            }));
            return (status, body).into_response();
        }

        if self.is_internal() {
            // Detalhe só no log; o cliente recebe mensagem genérica
            tracing::error!("Erro Interno do Servidor: {}", self);
            let body = Json(json!({ "error": "Ocorreu um erro inesperado." }));
            return (status, body).into_response();
        }

        let body = Json(json!({ "error": self.notice().text_es() }));
        (status, body).into_response()
    }
}

/// Unique violation do Postgres (SQLSTATE 23505).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}
