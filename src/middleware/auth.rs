// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::{
    extract::cookie::{Cookie, CookieJar, SameSite},
    headers::{authorization::Bearer, Authorization, HeaderMapExt},
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::flash::{self, Notice},
    models::auth::User,
};

pub const SESSION_COOKIE: &str = "fiado_session";

/// Cookie de sessão do navegador com o JWT. A validade fica no `exp` do token.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/").build())
}

// Bearer tem prioridade sobre o cookie
fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(auth.token().to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Guarda das páginas HTML: sem sessão válida volta para o login.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = session_token(request.headers()) else {
        return Redirect::to("/login").into_response();
    };

    match app_state.auth_service.validate_token(&token).await {
        Ok(user) => {
            request.extensions_mut().insert(AuthenticatedUser(user));
            next.run(request).await
        }
        Err(AppError::InvalidToken) => {
            flash::redirect(clear_session(jar), Notice::SessionExpired, "/login")
        }
        Err(e) => flash::bounce(jar, &e, "/login"),
    }
}

/// Guarda da API JSON: responde 401 em vez de redirecionar.
pub async fn api_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(request.headers()).ok_or(AppError::InvalidToken)?;
    let user = app_state.auth_service.validate_token(&token).await?;

    // Insere o usuário nos "extensions" da requisição
    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Páginas de administração. Roda depois do `auth_guard`.
pub async fn admin_guard(jar: CookieJar, request: Request, next: Next) -> Response {
    let Some(AuthenticatedUser(user)) = request.extensions().get::<AuthenticatedUser>() else {
        return Redirect::to("/login").into_response();
    };

    if !user.role.is_admin() {
        tracing::warn!("'{}' tentou acessar {} sem ser admin", user.username, request.uri().path());
        return flash::redirect(jar, Notice::Forbidden, "/");
    }
    next.run(request).await
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, HeaderValue, StatusCode},
        middleware::from_fn,
        routing::get,
        Router,
    };
    use chrono::Utc;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::models::auth::Role;

    fn user_with_role(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            username: format!("{}-test", role.as_str().to_lowercase()),
            password_hash: String::new(),
            role,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn admin_router(role: Role) -> Router {
        let user = user_with_role(role);
        Router::new()
            .route("/admin", get(|| async { "painel" }))
            .layer(from_fn(admin_guard))
            .layer(from_fn(move |mut request: Request, next: Next| {
                let user = user.clone();
                async move {
                    request.extensions_mut().insert(AuthenticatedUser(user));
                    next.run(request).await
                }
            }))
    }

    #[tokio::test]
    async fn admin_passes_admin_guard() {
        let response = admin_router(Role::Admin)
            .oneshot(Request::builder().uri("/admin").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn non_admin_is_sent_home_with_notice() {
        for role in [Role::Cobrador, Role::Cliente, Role::User] {
            let response = admin_router(role)
                .oneshot(Request::builder().uri("/admin").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(response.headers()[header::LOCATION], "/");
            let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
            assert!(cookie.starts_with("fiado_flash=forbidden"));
        }
    }

    #[test]
    fn bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("fiado_session=from-cookie"));
        assert_eq!(session_token(&headers).as_deref(), Some("from-cookie"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(session_token(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn no_token_without_credentials() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("jwt".into(), true).to_string();
        assert!(cookie.starts_with("fiado_session=jwt"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
    }
}
