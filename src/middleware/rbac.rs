// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedUser,
    models::auth::{Role, User},
};

/// 1. O Trait que define uma exigência de papel
pub trait RoleRequirement: Send + Sync + 'static {
    fn describe() -> &'static str;
    fn allows(role: Role) -> bool;
}

/// 2. O Extractor (Guardião). Entrega o usuário já verificado.
pub struct RequireRole<T>(pub User, pub PhantomData<T>);

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleRequirement,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // A. Extrai Usuário (colocado pelo api_guard)
        let AuthenticatedUser(user) = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)?;

        // B. Verifica o papel
        if !T::allows(user.role) {
            tracing::warn!(
                "'{}' ({}) barrado: requer {}",
                user.username,
                user.role.as_str(),
                T::describe()
            );
            return Err(AppError::Forbidden);
        }

        Ok(RequireRole(user, PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS EXIGÊNCIAS (TIPOS)
// ---

pub struct AdminOnly;
impl RoleRequirement for AdminOnly {
    fn describe() -> &'static str { "admin" }
    fn allows(role: Role) -> bool { role.is_admin() }
}

pub struct RecordsMovements;
impl RoleRequirement for RecordsMovements {
    fn describe() -> &'static str { "movements:write" }
    fn allows(role: Role) -> bool { role.can_record_movements() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        extract::Request,
        http::StatusCode,
        middleware::{from_fn, Next},
        routing::get,
        Router,
    };
    use chrono::Utc;
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn admin_only(RequireRole(user, _): RequireRole<AdminOnly>) -> String {
        user.username
    }

    async fn records(RequireRole(user, _): RequireRole<RecordsMovements>) -> String {
        user.username
    }

    fn router(role: Option<Role>) -> Router {
        let app = Router::new()
            .route("/admin", get(admin_only))
            .route("/record", get(records));

        let Some(role) = role else { return app };
        let user = User {
            id: Uuid::new_v4(),
            username: "maria".into(),
            password_hash: String::new(),
            role,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        app.layer(from_fn(move |mut request: Request, next: Next| {
            let user = user.clone();
            async move {
                request.extensions_mut().insert(AuthenticatedUser(user));
                next.run(request).await
            }
        }))
    }

    async fn status(role: Option<Role>, uri: &str) -> StatusCode {
        router(role)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn admin_only_routes() {
        assert_eq!(status(Some(Role::Admin), "/admin").await, StatusCode::OK);
        assert_eq!(status(Some(Role::Cobrador), "/admin").await, StatusCode::FORBIDDEN);
        assert_eq!(status(None, "/admin").await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn clients_cannot_record_movements() {
        assert_eq!(status(Some(Role::Cobrador), "/record").await, StatusCode::OK);
        assert_eq!(status(Some(Role::User), "/record").await, StatusCode::OK);
        assert_eq!(status(Some(Role::Cliente), "/record").await, StatusCode::FORBIDDEN);
    }
}
