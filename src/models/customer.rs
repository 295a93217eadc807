// src/models/customer.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::auth::{Role, User};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,

    #[schema(example = "María Rodríguez")]
    pub name: String,
    pub phone: Option<String>,
    pub identification: Option<String>,

    // Cobrador responsável (None = qualquer cobrador)
    pub cobrador_id: Option<Uuid>,
    // Login do cliente que pode ver o próprio extrato
    pub user_id: Option<Uuid>,

    // Cache do saldo; o extrato recalcula a partir dos movimentos
    #[schema(value_type = String, example = "85.00")]
    pub balance: Decimal,

    pub created_at: DateTime<Utc>,
}

// Linha da listagem de clientes
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub cobrador_name: Option<String>,
    #[schema(value_type = String, example = "85.00")]
    pub balance: Decimal,
    pub movement_count: i64,
    #[schema(value_type = Option<String>, format = Date)]
    pub last_movement: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerForm {
    #[validate(length(min = 1, max = 120, message = "invalid_name"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 40, message = "invalid_phone"))]
    pub phone: String,
    #[serde(default)]
    #[validate(length(max = 40, message = "invalid_identification"))]
    pub identification: String,
    // Username do cobrador; vazio = sem carteira
    #[serde(default)]
    pub cobrador: String,
    // Username do login "cliente" vinculado
    #[serde(default)]
    pub client_login: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerQuery {
    pub q: Option<String>,
}

/// Quais clientes um usuário pode ver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerScope {
    All,
    // Clientes sem cobrador ou atribuídos a este usuário
    Collector(Uuid),
    // Só as contas vinculadas ao login do cliente
    OwnAccount(Uuid),
}

impl CustomerScope {
    pub fn for_user(user: &User) -> Self {
        match user.role {
            Role::Admin => CustomerScope::All,
            Role::Cobrador | Role::User => CustomerScope::Collector(user.id),
            Role::Cliente => CustomerScope::OwnAccount(user.id),
        }
    }

    pub fn allows(&self, customer: &Customer) -> bool {
        match self {
            CustomerScope::All => true,
            CustomerScope::Collector(id) => customer.cobrador_id.is_none_or(|c| c == *id),
            CustomerScope::OwnAccount(id) => customer.user_id == Some(*id),
        }
    }

    /// Parâmetros ($1 tipo, $2 usuário) usados pelo filtro SQL do repositório.
    pub fn sql_params(&self) -> (&'static str, Option<Uuid>) {
        match self {
            CustomerScope::All => ("ALL", None),
            CustomerScope::Collector(id) => ("COLLECTOR", Some(*id)),
            CustomerScope::OwnAccount(id) => ("OWN", Some(*id)),
        }
    }
}
