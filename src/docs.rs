// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::api_login,

        // --- Customers ---
        handlers::customers::api_list,
        handlers::customers::api_statement,

        // --- Movements ---
        handlers::movements::api_record,

        // --- Admin ---
        handlers::admin::api_dashboard,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Customers ---
            models::customer::Customer,
            models::customer::CustomerSummary,

            // --- Movements ---
            models::movement::MovementKind,
            models::movement::Movement,
            models::movement::CreateMovementPayload,
            handlers::movements::RecordedMovementResponse,

            // --- Statement ---
            models::statement::StatementRange,
            models::statement::StatementLine,
            models::statement::Statement,

            // --- Dashboard ---
            models::dashboard::DashboardSummary,
            models::dashboard::DebtorEntry,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação da API"),
        (name = "Customers", description = "Clientes, saldos e extratos"),
        (name = "Movements", description = "Lançamento de compras e abonos"),
        (name = "Admin", description = "Indicadores do painel")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
