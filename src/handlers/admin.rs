// src/handlers/admin.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        flash::{self, Notice},
        i18n::Locale,
        input::{HtmlForm, HtmlPath},
        rbac::{AdminOnly, RequireRole},
    },
    models::{
        auth::{AdminResetForm, CreateUserForm, ResetPasswordForm, Role},
        dashboard::DashboardSummary,
    },
    views::{self, AdminDashboardTemplate, AdminUsersTemplate, Nav, ResetAdminTemplate},
};

pub async fn dashboard(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    locale: Locale,
    jar: CookieJar,
) -> Response {
    let summary = match app_state.dashboard_service.get_summary().await {
        Ok(summary) => summary,
        Err(e) => return flash::bounce(jar, &e, "/"),
    };

    let (jar, flash) = views::take_flash(jar, &locale);
    views::render(jar, AdminDashboardTemplate::new(Nav::for_user(&user), flash, summary))
}

pub async fn users_page(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    locale: Locale,
    jar: CookieJar,
) -> Response {
    let users = match app_state.user_service.list_users().await {
        Ok(users) => users,
        Err(e) => return flash::bounce(jar, &e, "/admin"),
    };

    let (jar, flash) = views::take_flash(jar, &locale);
    views::render(jar, AdminUsersTemplate::new(&user, flash, users))
}

pub async fn create_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    jar: CookieJar,
    HtmlForm(form): HtmlForm<CreateUserForm>,
) -> Response {
    let result = async {
        form.validate()?;
        let role = Role::parse(&form.role).ok_or(AppError::InvalidRole)?;
        app_state
            .user_service
            .create_user(&user, &form.username, &form.password, role)
            .await
    }
    .await;

    match result {
        Ok(_) => flash::redirect(jar, Notice::UserCreated, "/admin/users"),
        Err(e) => flash::bounce(jar, &e, "/admin/users"),
    }
}

pub async fn toggle_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    jar: CookieJar,
    HtmlPath(target_id): HtmlPath<Uuid>,
) -> Response {
    match app_state.user_service.toggle_active(&user, target_id).await {
        Ok(_) => flash::redirect(jar, Notice::UserToggled, "/admin/users"),
        Err(e) => flash::bounce(jar, &e, "/admin/users"),
    }
}

pub async fn reset_user_password(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    jar: CookieJar,
    HtmlPath(target_id): HtmlPath<Uuid>,
    HtmlForm(form): HtmlForm<ResetPasswordForm>,
) -> Response {
    if let Err(e) = form.validate() {
        return flash::bounce(jar, &AppError::from(e), "/admin/users");
    }

    match app_state
        .user_service
        .reset_password(&user, target_id, &form.new_password)
        .await
    {
        Ok(()) => flash::redirect(jar, Notice::PasswordReset, "/admin/users"),
        Err(e) => flash::bounce(jar, &e, "/admin/users"),
    }
}

// --- Recuperação do admin (pública, só com ADMIN_RESET_TOKEN) ---

pub async fn reset_admin_page(
    State(app_state): State<AppState>,
    locale: Locale,
    jar: CookieJar,
) -> Response {
    if app_state.config.admin_reset_token.is_none() {
        return StatusCode::NOT_FOUND.into_response();
    }

    let (jar, flash) = views::take_flash(jar, &locale);
    views::render(jar, ResetAdminTemplate { nav: None, flash })
}

pub async fn reset_admin_submit(
    State(app_state): State<AppState>,
    jar: CookieJar,
    HtmlForm(form): HtmlForm<AdminResetForm>,
) -> Response {
    let configured = app_state.config.admin_reset_token.as_deref();
    if configured.is_none() {
        return StatusCode::NOT_FOUND.into_response();
    }
    if let Err(e) = form.validate() {
        return flash::bounce(jar, &AppError::from(e), "/reset-admin");
    }

    match app_state
        .user_service
        .reset_admin_with_token(configured, &form.token, &form.username, &form.new_password)
        .await
    {
        Ok(()) => flash::redirect(jar, Notice::PasswordReset, "/login"),
        Err(AppError::Forbidden) => flash::redirect(jar, Notice::ResetTokenInvalid, "/reset-admin"),
        Err(e) => flash::bounce(jar, &e, "/reset-admin"),
    }
}

// --- API JSON ---

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    tag = "Admin",
    security(("api_jwt" = [])),
    responses(
        (status = 200, description = "Resumo do painel", body = DashboardSummary),
        (status = 403, description = "Apenas administradores")
    )
)]
pub async fn api_dashboard(
    State(app_state): State<AppState>,
    RequireRole(_admin, _): RequireRole<AdminOnly>,
) -> Result<Json<DashboardSummary>, AppError> {
    let summary = app_state.dashboard_service.get_summary().await?;
    Ok(Json(summary))
}
