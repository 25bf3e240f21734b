//! JSON extractor whose rejections use the API error envelope

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Serialize};

use super::error::{ApiError, ApiErrorType};

/// Drop-in for `axum::Json`
///
/// A malformed body, a missing content type or a body that does not fit
/// the target type is answered with `ApiError` and code `json_parse_error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => Err(rejection_to_error(&rejection)),
        }
    }
}

fn rejection_to_error(rejection: &JsonRejection) -> ApiError {
    let message = match rejection {
        JsonRejection::JsonDataError(err) => format!("Invalid JSON data: {}", err.body_text()),
        JsonRejection::JsonSyntaxError(err) => format!("Invalid JSON syntax: {}", err.body_text()),
        JsonRejection::MissingJsonContentType(_) => {
            "Missing Content-Type header. Expected 'application/json'.".to_string()
        }
        JsonRejection::BytesRejection(err) => {
            format!("Failed to read request body: {}", err.body_text())
        }
        _ => "Invalid JSON request".to_string(),
    };

    ApiError::new(rejection.status(), ApiErrorType::InvalidRequestError, message)
        .with_code("json_parse_error")
}

impl<T> IntoResponse for Json<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct RoleBody {
        role: String,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = axum::http::Request::builder().method("PUT").uri("/");

        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }

        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_is_extracted() {
        let Json(body) = Json::<RoleBody>::from_request(
            request(Some("application/json"), r#"{"role":"auditor"}"#),
            &(),
        )
        .await
        .unwrap();

        assert_eq!(body.role, "auditor");
    }

    #[tokio::test]
    async fn test_missing_content_type_is_rejected() {
        let err = Json::<RoleBody>::from_request(request(None, r#"{"role":"auditor"}"#), &())
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(err.response.error.code.as_deref(), Some("json_parse_error"));
    }

    #[tokio::test]
    async fn test_wrong_shape_is_data_error() {
        let err = Json::<RoleBody>::from_request(
            request(Some("application/json"), r#"{"role":42}"#),
            &(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.response.error.message.starts_with("Invalid JSON data"));
    }
}
