//! Request extractors.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON request body that never rejects with axum's own status codes.
///
/// A missing body, or one sent without a JSON content type, yields
/// `T::default()` so the service reports which fields are absent. Bodies that
/// do not deserialize into `T` become [`AppError::Validation`].
#[derive(Debug, Clone, Default)]
pub struct JsonBody<T>(pub T);

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json = is_json(req.headers());
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        if !json || bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }
        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Form {
        #[serde(default)]
        name: Option<String>,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = axum::http::Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn extract(content_type: Option<&str>, body: &'static str) -> Result<Form, AppError> {
        JsonBody::<Form>::from_request(request(content_type, body), &())
            .await
            .map(|JsonBody(form)| form)
    }

    #[tokio::test]
    async fn absent_or_untyped_bodies_are_empty() {
        assert_eq!(extract(None, "").await.unwrap(), Form::default());
        assert_eq!(extract(Some("application/json"), " ").await.unwrap(), Form::default());
        assert_eq!(
            extract(Some("text/plain"), r#"{"name":"x"}"#).await.unwrap(),
            Form::default()
        );
    }

    #[tokio::test]
    async fn json_bodies_deserialize() {
        let form = extract(Some("application/json; charset=utf-8"), r#"{"name":"x"}"#)
            .await
            .unwrap();
        assert_eq!(form.name.as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn bad_json_is_a_validation_error() {
        for body in [r#"{"name":5}"#, "{not json"] {
            let err = extract(Some("application/json"), body).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }
}
