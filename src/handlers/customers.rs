// src/handlers/customers.rs

use axum::{
    extract::{Path, Query, State},
    http::header,
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
        input::{HtmlForm, HtmlPath, HtmlQuery},
    },
    models::{
        auth::{Role, User},
        customer::{CreateCustomerForm, CustomerQuery, CustomerSummary},
        statement::{Statement, StatementQuery, StatementRange},
    },
    services::{csv_export::statement_csv, document_service::statement_filename},
    views::{self, CustomerRow, CustomersTemplate, Nav, StatementTemplate},
};

fn search(query: &CustomerQuery) -> Option<&str> {
    query.q.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

pub async fn index(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    locale: Locale,
    jar: CookieJar,
    HtmlQuery(query): HtmlQuery<CustomerQuery>,
) -> Response {
    let customers = match app_state.customer_service.list(&user, search(&query)).await {
        Ok(customers) => customers,
        Err(e) => return flash::bounce(jar, &e, "/"),
    };

    let (jar, flash) = views::take_flash(jar, &locale);
    views::render(
        jar,
        CustomersTemplate {
            nav: Some(Nav::for_user(&user)),
            flash,
            q: search(&query).unwrap_or_default().to_string(),
            rows: customers.into_iter().map(CustomerRow::from).collect(),
            can_manage: user.role.can_manage_customers(),
            choose_cobrador: user.role == Role::Admin,
        },
    )
}

pub async fn create(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    jar: CookieJar,
    HtmlForm(form): HtmlForm<CreateCustomerForm>,
) -> Response {
    if let Err(e) = form.validate() {
        return flash::bounce(jar, &AppError::from(e), "/customers");
    }

    match app_state.customer_service.create(&user, form).await {
        Ok(customer) => flash::redirect(jar, Notice::CustomerCreated, &format!("/customers/{}", customer.id)),
        Err(e) => flash::bounce(jar, &e, "/customers"),
    }
}

async fn load_statement(
    app_state: &AppState,
    user: &User,
    customer_id: Uuid,
    query: &StatementQuery,
) -> Result<Statement, AppError> {
    let range = StatementRange::try_from(query)?;
    app_state.customer_service.statement(user, customer_id, range).await
}

pub async fn statement_page(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    locale: Locale,
    jar: CookieJar,
    HtmlPath(customer_id): HtmlPath<Uuid>,
    HtmlQuery(query): HtmlQuery<StatementQuery>,
) -> Response {
    let statement = match load_statement(&app_state, &user, customer_id, &query).await {
        Ok(statement) => statement,
        // Filtro de datas inválido volta para o extrato sem filtro
        Err(e @ (AppError::InvalidDate | AppError::InvalidDateRange)) => {
            return flash::bounce(jar, &e, &format!("/customers/{}", customer_id));
        }
        Err(e) => return flash::bounce(jar, &e, "/customers"),
    };

    let (jar, flash) = views::take_flash(jar, &locale);
    views::render(jar, StatementTemplate::new(Nav::for_user(&user), flash, statement))
}

pub async fn statement_pdf(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    jar: CookieJar,
    HtmlPath(customer_id): HtmlPath<Uuid>,
    HtmlQuery(query): HtmlQuery<StatementQuery>,
) -> Response {
    let back = format!("/customers/{}", customer_id);
    let statement = match load_statement(&app_state, &user, customer_id, &query).await {
        Ok(statement) => statement,
        Err(e) => return flash::bounce(jar, &e, &back),
    };

    let filename = statement_filename(&statement.customer.name, "pdf");
    match app_state.document_service.generate_statement_pdf(statement).await {
        Ok(pdf_bytes) => attachment("application/pdf", &filename, pdf_bytes),
        Err(e) => flash::bounce(jar, &e, &back),
    }
}

pub async fn statement_csv_download(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    jar: CookieJar,
    HtmlPath(customer_id): HtmlPath<Uuid>,
    HtmlQuery(query): HtmlQuery<StatementQuery>,
) -> Response {
    let back = format!("/customers/{}", customer_id);
    let result = async {
        let statement = load_statement(&app_state, &user, customer_id, &query).await?;
        let bytes = statement_csv(&statement)?;
        Ok::<_, AppError>((statement_filename(&statement.customer.name, "csv"), bytes))
    }
    .await;

    match result {
        Ok((filename, bytes)) => attachment("text/csv; charset=utf-8", &filename, bytes),
        Err(e) => flash::bounce(jar, &e, &back),
    }
}

// Configura os Headers para o navegador baixar o arquivo
fn attachment(content_type: &'static str, filename: &str, bytes: Vec<u8>) -> Response {
    let headers = [
        (header::CONTENT_TYPE, content_type.to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
    ];
    (headers, bytes).into_response()
}

// --- API JSON ---

#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    params(("q" = Option<String>, Query, description = "Busca pelo nome")),
    security(("api_jwt" = [])),
    responses(
        (status = 200, description = "Clientes visíveis com saldo", body = [CustomerSummary]),
        (status = 401, description = "Sem sessão")
    )
)]
pub async fn api_list(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<CustomerQuery>,
) -> Result<Json<Vec<CustomerSummary>>, AppError> {
    let customers = app_state.customer_service.list(&user, search(&query)).await?;
    Ok(Json(customers))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}/statement",
    tag = "Customers",
    params(
        ("id" = Uuid, Path, description = "ID do cliente"),
        ("from" = Option<String>, Query, description = "Data inicial (YYYY-MM-DD)"),
        ("to" = Option<String>, Query, description = "Data final (YYYY-MM-DD)")
    ),
    security(("api_jwt" = [])),
    responses(
        (status = 200, description = "Extrato com saldo acumulado", body = Statement),
        (status = 403, description = "Cliente fora da carteira"),
        (status = 404, description = "Cliente não encontrado")
    )
)]
pub async fn api_statement(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(customer_id): Path<Uuid>,
    Query(query): Query<StatementQuery>,
) -> Result<Json<Statement>, AppError> {
    let statement = load_statement(&app_state, &user, customer_id, &query).await?;
    Ok(Json(statement))
}
