// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

const SUPPORTED: [&str; 2] = ["en", "id"];

/// Primary language subtag of the request (`en` or `id`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale("en".to_string())
    }
}

impl Locale {
    pub fn is_indonesian(&self) -> bool {
        self.0 == "id"
    }

    /// Picks the first supported language from an `Accept-Language` value.
    pub fn from_header(value: &str) -> Self {
        accept_language::intersection(value, &SUPPORTED)
            .into_iter()
            .next()
            .map(|lang| Locale(lang.to_string()))
            .or_else(|| {
                // "id-ID" / "en-US" without a bare tag in the list
                accept_language::parse(value)
                    .first()
                    .and_then(|tag| tag.split('-').next())
                    .filter(|primary| SUPPORTED.contains(primary))
                    .map(|primary| Locale(primary.to_string()))
            })
            .unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let locale = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .map(Locale::from_header)
            .unwrap_or_default();

        Ok(locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indonesian_is_picked_from_regional_tags() {
        assert!(Locale::from_header("id-ID,id;q=0.9,en;q=0.8").is_indonesian());
        assert!(Locale::from_header("id-ID").is_indonesian());
    }

    #[test]
    fn unsupported_languages_fall_back_to_english() {
        assert_eq!(Locale::from_header("pt-BR,pt;q=0.9"), Locale::default());
        assert_eq!(Locale::from_header("en-US"), Locale("en".into()));
    }
}
