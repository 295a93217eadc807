// src/handlers/movements.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        flash::{self, Notice},
        i18n::Locale,
        input::{HtmlForm, HtmlQuery},
        rbac::{RecordsMovements, RequireRole},
    },
    models::{
        customer::Customer,
        movement::{CreateMovementPayload, Movement, MovementQuery, NewMovementForm},
    },
    views::{self, page_link, MovementRow, MovementsTemplate, Nav},
};

/// Tela principal: formulário de lançamento e listagem paginada.
pub async fn index(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    locale: Locale,
    jar: CookieJar,
    HtmlQuery(query): HtmlQuery<MovementQuery>,
) -> Response {
    let (rows, page) = match app_state.movement_service.list(&user, &query).await {
        Ok(result) => result,
        Err(e) => return views::error_page(&e, &locale),
    };

    // Sugestões do campo "cliente"
    let customer_names = if user.role.can_record_movements() {
        match app_state.customer_service.list(&user, None).await {
            Ok(customers) => customers.into_iter().map(|c| c.name).collect(),
            Err(e) => {
                tracing::warn!("Sem sugestões de clientes: {}", e);
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let q = query.search().unwrap_or_default().to_string();
    let (jar, flash) = views::take_flash(jar, &locale);

    views::render(
        jar,
        MovementsTemplate {
            nav: Some(Nav::for_user(&user)),
            flash,
            today: chrono::Local::now().date_naive().to_string(),
            customer_names,
            rows: rows.into_iter().map(MovementRow::from).collect(),
            prev_link: page.has_prev().then(|| page_link(&q, page.number - 1)),
            next_link: page.has_next().then(|| page_link(&q, page.number + 1)),
            page: page.number,
            total_pages: page.total_pages(),
            total_items: page.total_items,
            q,
        },
    )
}

pub async fn record(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    jar: CookieJar,
    HtmlForm(form): HtmlForm<NewMovementForm>,
) -> Response {
    let new_movement = match form.parse() {
        Ok(m) => m,
        Err(e) => return flash::bounce(jar, &e, "/"),
    };

    match app_state.movement_service.record(&user, new_movement).await {
        Ok(_) => flash::redirect(jar, Notice::MovementSaved, "/"),
        Err(e) => flash::bounce(jar, &e, "/"),
    }
}

// --- API JSON ---

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordedMovementResponse {
    pub movement: Movement,
    pub customer: Customer,
}

#[utoipa::path(
    post,
    path = "/api/movements",
    tag = "Movements",
    request_body = CreateMovementPayload,
    security(("api_jwt" = [])),
    responses(
        (status = 201, description = "Movimento registrado", body = RecordedMovementResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Sem permissão para lançar neste cliente")
    )
)]
pub async fn api_record(
    State(app_state): State<AppState>,
    RequireRole(user, _): RequireRole<RecordsMovements>,
    Json(payload): Json<CreateMovementPayload>,
) -> Result<(StatusCode, Json<RecordedMovementResponse>), AppError> {
    let new_movement = payload.parse()?;
    let recorded = app_state.movement_service.record(&user, new_movement).await?;

    let mut customer = recorded.customer;
    customer.balance = recorded.balance;

    Ok((
        StatusCode::CREATED,
        Json(RecordedMovementResponse { movement: recorded.movement, customer }),
    ))
}
