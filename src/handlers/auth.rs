// src/handlers/auth.rs

use axum::{
    extract::State,
    response::Response,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::{clear_session, session_cookie, AuthenticatedUser},
        flash::{self, Notice},
        i18n::Locale,
        input::HtmlForm,
    },
    models::auth::{AuthResponse, ChangePasswordForm, LoginForm, LoginUserPayload},
    views::{self, LoginTemplate, Nav, PasswordTemplate},
};

pub async fn health() -> &'static str {
    "OK"
}

pub async fn login_page(State(app_state): State<AppState>, locale: Locale, jar: CookieJar) -> Response {
    let (jar, flash) = views::take_flash(jar, &locale);
    views::render(
        jar,
        LoginTemplate {
            nav: None,
            flash,
            username: String::new(),
            reset_enabled: app_state.config.admin_reset_token.is_some(),
        },
    )
}

pub async fn login_submit(
    State(app_state): State<AppState>,
    jar: CookieJar,
    HtmlForm(form): HtmlForm<LoginForm>,
) -> Response {
    let user = match app_state.auth_service.login(&form.username, &form.password).await {
        Ok(user) => user,
        Err(e) => return flash::bounce(jar, &e, "/login"),
    };

    match app_state.auth_service.create_token(user.id) {
        Ok(token) => {
            let jar = jar.add(session_cookie(token, app_state.config.cookie_secure));
            flash::redirect(jar, Notice::LoginOk, "/")
        }
        Err(e) => flash::bounce(jar, &e, "/login"),
    }
}

pub async fn logout(jar: CookieJar) -> Response {
    flash::redirect(clear_session(jar), Notice::LoggedOut, "/login")
}

pub async fn password_page(
    AuthenticatedUser(user): AuthenticatedUser,
    locale: Locale,
    jar: CookieJar,
) -> Response {
    let (jar, flash) = views::take_flash(jar, &locale);
    views::render(jar, PasswordTemplate { nav: Some(Nav::for_user(&user)), flash })
}

pub async fn password_submit(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    jar: CookieJar,
    HtmlForm(form): HtmlForm<ChangePasswordForm>,
) -> Response {
    if let Err(e) = form.validate() {
        return flash::bounce(jar, &AppError::from(e), "/account/password");
    }

    match app_state
        .user_service
        .change_own_password(&user, &form.current_password, &form.new_password)
        .await
    {
        Ok(()) => flash::redirect(jar, Notice::PasswordChanged, "/"),
        Err(e) => flash::bounce(jar, &e, "/account/password"),
    }
}

// --- API JSON ---

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Token de sessão", body = AuthResponse),
        (status = 401, description = "Usuário ou senha incorretos")
    )
)]
pub async fn api_login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginUserPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate()?;

    let user = app_state.auth_service.login(&payload.username, &payload.password).await?;
    let token = app_state.auth_service.create_token(user.id)?;

    Ok(Json(AuthResponse { token }))
}
