// src/config.rs

use std::{env, path::PathBuf, time::Duration};

use anyhow::{bail, Context};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{CustomerRepository, DashboardRepository, MovementRepository, UserRepository},
    services::{
        auth::AuthService, customer_service::CustomerService, dashboard_service::DashboardService,
        document_service::{DocumentService, PdfSettings}, movement_service::MovementService,
        user_service::UserService,
    },
};

const MIN_SECRET_LEN: usize = 16;

/// Configuração lida do ambiente (.env é carregado antes).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub session_secret: String,
    pub admin_reset_token: Option<String>,
    pub default_admin_username: String,
    pub default_admin_password: Option<String>,
    pub bind_addr: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
    pub pdf: PdfSettings,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Separado de `from_env` para poder testar sem mexer no ambiente do processo.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").context("DATABASE_URL deve ser definida")?;

        let session_secret = get("SESSION_SECRET").context("SESSION_SECRET deve ser definido")?;
        if session_secret.len() < MIN_SECRET_LEN {
            bail!("SESSION_SECRET deve ter pelo menos {} caracteres", MIN_SECRET_LEN);
        }

        let port = match get("PORT") {
            Some(p) => p.parse().with_context(|| format!("PORT inválida: {}", p))?,
            None => 3000,
        };
        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(n) => n.parse().with_context(|| format!("DB_MAX_CONNECTIONS inválido: {}", n))?,
            None => 5,
        };
        let session_ttl_hours = match get("SESSION_TTL_HOURS") {
            Some(n) => n.parse().with_context(|| format!("SESSION_TTL_HOURS inválido: {}", n))?,
            None => 12,
        };
        let cookie_secure = get("COOKIE_SECURE")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let pdf = PdfSettings {
            fonts_dir: PathBuf::from(get("PDF_FONTS_DIR").unwrap_or_else(|| "./fonts".into())),
            font_family: get("PDF_FONT_FAMILY").unwrap_or_else(|| "Roboto".into()),
            logo_path: PathBuf::from(get("STATEMENT_LOGO").unwrap_or_else(|| "static/logo.jpg".into())),
            subtitle: get("STATEMENT_SUBTITLE")
                .unwrap_or_else(|| "Cocina - Iglesia Bautista Fundamental de Costa Rica".into()),
        };

        Ok(Self {
            database_url,
            session_secret,
            admin_reset_token: get("ADMIN_RESET_TOKEN"),
            default_admin_username: get("DEFAULT_ADMIN_USERNAME").unwrap_or_else(|| "admin".into()),
            default_admin_password: get("DEFAULT_ADMIN_PASSWORD"),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_max_connections,
            session_ttl_hours,
            cookie_secure,
            pdf,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Config,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub customer_service: CustomerService,
    pub movement_service: MovementService,
    pub document_service: DocumentService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::with_pool(db_pool, config))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(db_pool: PgPool, config: Config) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let movement_repo = MovementRepository::new(db_pool.clone());
        let dashboard_repo = DashboardRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            config.session_secret.clone(),
            config.session_ttl_hours,
        );
        let user_service = UserService::new(user_repo.clone(), db_pool.clone());
        let customer_service = CustomerService::new(customer_repo.clone(), movement_repo.clone(), user_repo);
        let movement_service = MovementService::new(movement_repo, customer_repo, db_pool.clone());
        let document_service = DocumentService::new(config.pdf.clone());
        let dashboard_service = DashboardService::new(dashboard_repo);

        Self {
            db_pool,
            config,
            auth_service,
            user_service,
            customer_service,
            movement_service,
            document_service,
            dashboard_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/fiado"),
        ("SESSION_SECRET", "0123456789abcdef0123"),
    ];

    #[test]
    fn applies_defaults() {
        let config = Config::from_lookup(lookup(BASE)).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.listen_addr(), "0.0.0.0:3000");
        assert_eq!(config.default_admin_username, "admin");
        assert!(config.default_admin_password.is_none());
        assert!(config.admin_reset_token.is_none());
        assert_eq!(config.session_ttl_hours, 12);
        assert!(!config.cookie_secure);
        assert_eq!(config.pdf.font_family, "Roboto");
    }

    #[test]
    fn reads_overrides() {
        let mut pairs = BASE.to_vec();
        pairs.extend([
            ("PORT", "8080"),
            ("ADMIN_RESET_TOKEN", "s3cr3t"),
            ("COOKIE_SECURE", "true"),
            ("DEFAULT_ADMIN_PASSWORD", " cocina "),
        ]);
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.admin_reset_token.as_deref(), Some("s3cr3t"));
        assert!(config.cookie_secure);
        assert_eq!(config.default_admin_password.as_deref(), Some("cocina"));
    }

    #[test]
    fn rejects_missing_database_url_and_weak_secret() {
        assert!(Config::from_lookup(lookup(&[("SESSION_SECRET", "0123456789abcdef0123")])).is_err());
        assert!(Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/fiado"),
            ("SESSION_SECRET", "corto"),
        ]))
        .is_err());

        let mut pairs = BASE.to_vec();
        pairs.push(("PORT", "http"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());
    }
}
