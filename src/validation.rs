//! Request body validation at the HTTP boundary.

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use regex::Regex;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Checks a deserialized request body before it reaches a handler.
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

/// JSON body that has been parsed and validated.
///
/// Malformed JSON and failed validation both reject with a 400
/// `{ success: false, error }` body.
#[derive(Debug, Clone)]
pub struct Validated<T>(pub T);

impl<T, S> FromRequest<S> for Validated<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        value.validate()?;
        Ok(Validated(value))
    }
}

lazy_static::lazy_static! {
    /// Lowercase letters, numbers and single hyphens
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_REGEX.is_match(slug)
}

/// Derive a slug from a display name ("Jane O'Neil" -> "jane-o-neil").
pub fn slugify(name: &str) -> String {
    NON_SLUG_CHARS
        .replace_all(&name.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

/// Fail with "`field` is required" when the value is blank.
pub fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Optional absolute http(s) URL.
pub fn optional_http_url(field: &str, value: Option<&str>) -> Result<(), ApiError> {
    match value.map(str::trim) {
        None | Some("") => Ok(()),
        Some(url) if url.starts_with("https://") || url.starts_with("http://") => Ok(()),
        Some(_) => Err(ApiError::Validation(format!(
            "{field} must be an http(s) URL"
        ))),
    }
}
