// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

const SUPPORTED: &[&str] = &["es", "en"];
const DEFAULT_LANG: &str = "es";

// Extrator de idioma para os avisos das páginas
#[derive(Debug, Clone)]
pub struct Locale(pub String);

impl Locale {
    pub fn from_header(header_str: Option<&str>) -> Self {
        let lang = header_str
            .and_then(|header_str| {
                accept_language::parse(header_str)
                    .into_iter()
                    // "es-CR" -> "es"
                    .map(|tag| tag.split('-').next().unwrap_or(&tag).to_lowercase())
                    .find(|lang| SUPPORTED.contains(&lang.as_str()))
            })
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        Locale(lang)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANG.to_string())
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let header_str = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok());

        Ok(Locale::from_header(header_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_supported_language() {
        assert_eq!(Locale::from_header(Some("en-US,en;q=0.9,es;q=0.8")).0, "en");
        assert_eq!(Locale::from_header(Some("fr-FR,es;q=0.5")).0, "es");
        assert_eq!(Locale::from_header(Some("es-CR")).0, "es");
    }

    #[test]
    fn falls_back_to_spanish() {
        assert_eq!(Locale::from_header(None).0, "es");
        assert_eq!(Locale::from_header(Some("de")).0, "es");
    }
}
