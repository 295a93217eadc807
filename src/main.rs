//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;
mod views;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::{admin_guard, api_guard, auth_guard};
use crate::services::auth::BootstrapOutcome;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let app_state = AppState::new(config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let outcome = app_state
        .auth_service
        .bootstrap_admin(
            &app_state.config.default_admin_username,
            app_state.config.default_admin_password.as_deref(),
        )
        .await?;
    if outcome == BootstrapOutcome::AlreadyHasAdmin {
        tracing::info!("Admin ativo encontrado");
    }

    let addr = app_state.config.listen_addr();
    let app = app(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn app(app_state: AppState) -> Router {
    // Páginas públicas
    let public_routes = Router::new()
        .route("/health", get(handlers::auth::health))
        .route("/login", get(handlers::auth::login_page).post(handlers::auth::login_submit))
        .route("/logout", get(handlers::auth::logout).post(handlers::auth::logout))
        .route(
            "/reset-admin",
            get(handlers::admin::reset_admin_page).post(handlers::admin::reset_admin_submit),
        );

    // Páginas com sessão
    let session_routes = Router::new()
        .route("/", get(handlers::movements::index).post(handlers::movements::record))
        .route("/customers", get(handlers::customers::index).post(handlers::customers::create))
        .route("/customers/{id}", get(handlers::customers::statement_page))
        .route("/customers/{id}/pdf", get(handlers::customers::statement_pdf))
        .route("/customers/{id}/csv", get(handlers::customers::statement_csv_download))
        .route(
            "/account/password",
            get(handlers::auth::password_page).post(handlers::auth::password_submit),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Administração: auth_guard roda antes do admin_guard
    let admin_routes = Router::new()
        .route("/admin", get(handlers::admin::dashboard))
        .route("/admin/users", get(handlers::admin::users_page).post(handlers::admin::create_user))
        .route("/admin/users/{id}/toggle", post(handlers::admin::toggle_user))
        .route("/admin/users/{id}/password", post(handlers::admin::reset_user_password))
        .layer(axum_middleware::from_fn(admin_guard))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // API JSON
    let api_routes = Router::new()
        .route("/customers", get(handlers::customers::api_list))
        .route("/customers/{id}/statement", get(handlers::customers::api_statement))
        .route("/movements", post(handlers::movements::api_record))
        .route("/admin/dashboard", get(handlers::admin::api_dashboard))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            api_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(admin_routes)
        .route("/api/auth/login", post(handlers::auth::api_login))
        .nest("/api", api_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Falha ao escutar o sinal de desligamento: {}", e);
    }
    tracing::info!("Encerrando o servidor");
}
