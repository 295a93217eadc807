// src/middleware/input.rs
//
// Extratores das páginas HTML: quando o axum rejeita o Form, a Query ou o
// Path, o usuário volta para uma página conhecida com aviso, em vez de
// receber o texto cru de 400/422.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use serde::de::DeserializeOwned;

use crate::middleware::flash::{self, Notice};

// Mais específicas primeiro; nada fora desta lista vira destino de redirect
const LANDING_PAGES: [&str; 6] = [
    "/admin/users",
    "/admin",
    "/customers",
    "/account/password",
    "/reset-admin",
    "/login",
];

/// Página para onde volta uma requisição com entrada inválida.
pub fn landing_page(path: &str) -> &'static str {
    LANDING_PAGES
        .iter()
        .copied()
        .find(|page| {
            path.strip_prefix(page)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
        .unwrap_or("/")
}

#[derive(Debug)]
pub struct InputRejection {
    back: &'static str,
    reason: String,
}

impl InputRejection {
    fn new(path: &str, reason: String) -> Self {
        Self { back: landing_page(path), reason }
    }
}

impl IntoResponse for InputRejection {
    fn into_response(self) -> Response {
        tracing::warn!("Entrada rejeitada ({}): {}", self.back, self.reason);
        flash::redirect(CookieJar::new(), Notice::InvalidForm, self.back)
    }
}

pub struct HtmlForm<T>(pub T);

impl<S, T> FromRequest<S> for HtmlForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = InputRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let path = req.uri().path().to_string();
        match Form::<T>::from_request(req, state).await {
            Ok(Form(value)) => Ok(HtmlForm(value)),
            Err(rejection) => Err(InputRejection::new(&path, rejection.body_text())),
        }
    }
}

pub struct HtmlQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for HtmlQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = InputRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(HtmlQuery(value)),
            Err(rejection) => Err(InputRejection::new(parts.uri.path(), rejection.body_text())),
        }
    }
}

pub struct HtmlPath<T>(pub T);

impl<S, T> FromRequestParts<S> for HtmlPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = InputRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(HtmlPath(value)),
            Err(rejection) => Err(InputRejection::new(parts.uri.path(), rejection.body_text())),
        }
    }
}
