// src/views.rs
//
// Templates askama das páginas. Os handlers montam as linhas já formatadas
// e os templates só exibem.

use askama::Template;
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    common::{
        error::AppError,
        format::{format_date, format_money},
    },
    middleware::{
        flash::{self, FlashView},
        i18n::Locale,
    },
    models::{
        auth::{Role, User},
        customer::CustomerSummary,
        dashboard::DashboardSummary,
        movement::{MovementKind, MovementListRow},
        statement::Statement,
    },
};

/// Consome o aviso pendente e devolve o jar que apaga o cookie.
pub fn take_flash(jar: CookieJar, locale: &Locale) -> (CookieJar, Option<FlashView>) {
    let (jar, notice) = flash::take(jar);
    (jar, notice.map(|n| FlashView::new(n, locale)))
}

pub fn render<T: Template>(jar: CookieJar, tpl: T) -> Response {
    match tpl.render() {
        Ok(html) => (jar, Html(html)).into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}

/// Falha ao montar a tela principal: responde direto, sem redirect em loop.
pub fn error_page(err: &AppError, locale: &Locale) -> Response {
    if err.is_internal() {
        tracing::error!("Erro ao montar a página: {}", err);
    } else {
        tracing::warn!("Página recusada: {}", err);
    }
    let body = format!(
        "<!DOCTYPE html><meta charset=\"utf-8\"><p>{}</p><p><a href=\"/logout\">Salir</a></p>",
        err.notice().text(locale)
    );
    (err.status(), Html(body)).into_response()
}

// Menu do topo
pub struct Nav {
    pub username: String,
    pub role_label: &'static str,
    pub is_admin: bool,
    pub can_record: bool,
    pub can_manage_customers: bool,
}

impl Nav {
    pub fn for_user(user: &User) -> Self {
        Nav {
            username: user.username.clone(),
            role_label: user.role.label(),
            is_admin: user.role.is_admin(),
            can_record: user.role.can_record_movements(),
            can_manage_customers: user.role.can_manage_customers(),
        }
    }
}

fn kind_css(kind: MovementKind) -> &'static str {
    match kind {
        MovementKind::Purchase => "compra",
        MovementKind::Payment => "abono",
    }
}

fn balance_css(balance: rust_decimal::Decimal) -> &'static str {
    if balance.is_sign_positive() && !balance.is_zero() { "debt" } else { "clear" }
}

/// ---------- LOGIN ----------

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub nav: Option<Nav>,
    pub flash: Option<FlashView>,
    pub username: String,
    pub reset_enabled: bool,
}

#[derive(Template)]
#[template(path = "reset_admin.html")]
pub struct ResetAdminTemplate {
    pub nav: Option<Nav>,
    pub flash: Option<FlashView>,
}

#[derive(Template)]
#[template(path = "password.html")]
pub struct PasswordTemplate {
    pub nav: Option<Nav>,
    pub flash: Option<FlashView>,
}

/// ---------- MOVIMENTOS ----------

pub struct MovementRow {
    pub date: String,
    pub customer_id: String,
    pub customer_name: String,
    pub description: String,
    pub kind_label: &'static str,
    pub kind_css: &'static str,
    pub amount: String,
    pub recorded_by: String,
}

impl From<MovementListRow> for MovementRow {
    fn from(row: MovementListRow) -> Self {
        MovementRow {
            date: format_date(row.movement_date),
            customer_id: row.customer_id.to_string(),
            customer_name: row.customer_name,
            description: row.description,
            kind_label: row.kind.label(),
            kind_css: kind_css(row.kind),
            amount: format_money(row.amount),
            recorded_by: row.recorded_by_name.unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "movements.html")]
pub struct MovementsTemplate {
    pub nav: Option<Nav>,
    pub flash: Option<FlashView>,
    pub today: String,
    pub customer_names: Vec<String>,
    pub rows: Vec<MovementRow>,
    pub q: String,
    pub page: u32,
    pub total_pages: u32,
    pub total_items: i64,
    pub prev_link: Option<String>,
    pub next_link: Option<String>,
}

/// Link de página preservando a busca.
pub fn page_link(q: &str, page: u32) -> String {
    if q.is_empty() {
        format!("/?page={}", page)
    } else {
        format!("/?q={}&page={}", urlencoding::encode(q), page)
    }
}

/// ---------- CLIENTES ----------

pub struct CustomerRow {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub cobrador: String,
    pub balance: String,
    pub balance_css: &'static str,
    pub movement_count: i64,
    pub last_movement: String,
}

impl From<CustomerSummary> for CustomerRow {
    fn from(c: CustomerSummary) -> Self {
        CustomerRow {
            id: c.id.to_string(),
            name: c.name,
            phone: c.phone.unwrap_or_default(),
            cobrador: c.cobrador_name.unwrap_or_default(),
            balance: format_money(c.balance),
            balance_css: balance_css(c.balance),
            movement_count: c.movement_count,
            last_movement: c.last_movement.map(format_date).unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "customers.html")]
pub struct CustomersTemplate {
    pub nav: Option<Nav>,
    pub flash: Option<FlashView>,
    pub q: String,
    pub rows: Vec<CustomerRow>,
    pub can_manage: bool,
    // Só o admin escolhe o cobrador; o cobrador cria na própria carteira
    pub choose_cobrador: bool,
}

/// ---------- EXTRATO ----------

pub struct StatementRow {
    pub date: String,
    pub description: String,
    pub kind_label: &'static str,
    pub kind_css: &'static str,
    pub amount: String,
    pub balance: String,
}

#[derive(Template)]
#[template(path = "statement.html")]
pub struct StatementTemplate {
    pub nav: Option<Nav>,
    pub flash: Option<FlashView>,
    pub customer_id: String,
    pub customer_name: String,
    pub phone: String,
    pub from: String,
    pub to: String,
    pub has_opening: bool,
    pub opening_balance: String,
    pub rows: Vec<StatementRow>,
    pub total_purchases: String,
    pub total_payments: String,
    pub final_balance: String,
    pub final_css: &'static str,
    pub export_query: String,
}

impl StatementTemplate {
    pub fn new(nav: Nav, flash: Option<FlashView>, statement: Statement) -> Self {
        let from = statement.range.from.map(|d| d.to_string()).unwrap_or_default();
        let to = statement.range.to.map(|d| d.to_string()).unwrap_or_default();

        let mut params = Vec::new();
        if !from.is_empty() {
            params.push(format!("from={}", from));
        }
        if !to.is_empty() {
            params.push(format!("to={}", to));
        }
        let export_query = if params.is_empty() { String::new() } else { format!("?{}", params.join("&")) };

        let rows = statement
            .lines
            .iter()
            .map(|line| StatementRow {
                date: format_date(line.date),
                description: line.description.clone(),
                kind_label: line.kind.label(),
                kind_css: kind_css(line.kind),
                amount: format_money(line.amount),
                balance: format_money(line.balance),
            })
            .collect();

        StatementTemplate {
            nav: Some(nav),
            flash,
            customer_id: statement.customer.id.to_string(),
            customer_name: statement.customer.name.clone(),
            phone: statement.customer.phone.clone().unwrap_or_default(),
            has_opening: statement.range.from.is_some(),
            opening_balance: format_money(statement.opening_balance),
            rows,
            total_purchases: format_money(statement.total_purchases),
            total_payments: format_money(statement.total_payments),
            final_balance: format_money(statement.final_balance),
            final_css: balance_css(statement.final_balance),
            from,
            to,
            export_query,
        }
    }
}

/// ---------- ADMIN ----------

pub struct DebtorRow {
    pub id: String,
    pub name: String,
    pub balance: String,
}

#[derive(Template)]
#[template(path = "admin_dashboard.html")]
pub struct AdminDashboardTemplate {
    pub nav: Option<Nav>,
    pub flash: Option<FlashView>,
    pub customers_count: i64,
    pub customers_with_debt: i64,
    pub outstanding_total: String,
    pub purchases_this_month: String,
    pub payments_this_month: String,
    pub movements_today: i64,
    pub active_users: i64,
    pub debtors: Vec<DebtorRow>,
}

impl AdminDashboardTemplate {
    pub fn new(nav: Nav, flash: Option<FlashView>, summary: DashboardSummary) -> Self {
        AdminDashboardTemplate {
            nav: Some(nav),
            flash,
            customers_count: summary.customers_count,
            customers_with_debt: summary.customers_with_debt,
            outstanding_total: format_money(summary.outstanding_total),
            purchases_this_month: format_money(summary.purchases_this_month),
            payments_this_month: format_money(summary.payments_this_month),
            movements_today: summary.movements_today,
            active_users: summary.active_users,
            debtors: summary
                .top_debtors
                .into_iter()
                .map(|d| DebtorRow {
                    id: d.customer_id.to_string(),
                    name: d.name,
                    balance: format_money(d.balance),
                })
                .collect(),
        }
    }
}

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub role_label: &'static str,
    pub active: bool,
    pub is_self: bool,
    pub created_at: String,
}

pub struct RoleOption {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Template)]
#[template(path = "admin_users.html")]
pub struct AdminUsersTemplate {
    pub nav: Option<Nav>,
    pub flash: Option<FlashView>,
    pub users: Vec<UserRow>,
    pub roles: Vec<RoleOption>,
}

impl AdminUsersTemplate {
    pub fn new(actor: &User, flash: Option<FlashView>, users: Vec<User>) -> Self {
        AdminUsersTemplate {
            nav: Some(Nav::for_user(actor)),
            flash,
            users: users
                .into_iter()
                .map(|u| UserRow {
                    id: u.id.to_string(),
                    is_self: u.id == actor.id,
                    username: u.username,
                    role_label: u.role.label(),
                    active: u.active,
                    created_at: u.created_at.format("%d/%m/%Y").to_string(),
                })
                .collect(),
            roles: Role::ALL
                .into_iter()
                .map(|r| RoleOption { value: r.as_str(), label: r.label() })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_links_keep_search() {
        assert_eq!(page_link("", 2), "/?page=2");
        assert_eq!(page_link("Ana Solís", 3), "/?q=Ana%20Sol%C3%ADs&page=3");
        assert_eq!(page_link("a&b", 1), "/?q=a%26b&page=1");
    }

    #[test]
    fn login_page_renders_flash_escaped() {
        let tpl = LoginTemplate {
            nav: None,
            flash: Some(FlashView { level: "error", text: "<b>x" }),
            username: "ana".into(),
            reset_enabled: false,
        };
        let html = tpl.render().unwrap();
        assert!(html.contains("&lt;b&gt;x"));
        assert!(html.contains("value=\"ana\""));
        assert!(!html.contains("/reset-admin"));
    }

    #[test]
    fn balance_classes() {
        assert_eq!(balance_css(rust_decimal::Decimal::new(8500, 2)), "debt");
        assert_eq!(balance_css(rust_decimal::Decimal::ZERO), "clear");
        assert_eq!(balance_css(rust_decimal::Decimal::new(-100, 2)), "clear");
    }
}
