//! JSON body extractor answering malformed bodies with the error envelope.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use crate::http::error::AppError;

/// Like [`axum::Json`], but rejections become `VALIDATION_ERROR` envelopes.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    AppError::Validation(rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use chatbox_types::chat::SendMessageRequest;

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_is_extracted() {
        let ApiJson(req) =
            ApiJson::<SendMessageRequest>::from_request(json_request(r#"{"message":"Hi"}"#), &())
                .await
                .unwrap();
        assert_eq!(req.message, "Hi");
    }

    #[tokio::test]
    async fn test_missing_field_is_validation_error() {
        let Err(err) =
            ApiJson::<SendMessageRequest>::from_request(json_request(r#"{"personaId":1}"#), &())
                .await
        else {
            panic!("expected rejection");
        };
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "VALIDATION_ERROR");
        assert!(message.contains("message"));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_rejected_with_envelope() {
        let req = Request::builder()
            .method("POST")
            .body(Body::from(r#"{"message":"Hi"}"#))
            .unwrap();
        let Err(err) = ApiJson::<SendMessageRequest>::from_request(req, &()).await else {
            panic!("expected rejection");
        };
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
