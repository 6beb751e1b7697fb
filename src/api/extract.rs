//! Request extractors whose rejections use the JSON error body.
//!
//! These wrap axum's `Json`, `Path`, and `Query` and turn their rejections
//! into [`GatewayError::InvalidRequest`], so a malformed body, id, or query
//! string is answered with `{"error": {...}}` like every other failure.

use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::error::GatewayError;

/// JSON request body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Path parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Path(value) =
            axum::extract::Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Query-string parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Query(value) =
            axum::extract::Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use serde::Deserialize;

    use crate::domain::Money;

    #[derive(Debug, Deserialize)]
    struct AmountBody {
        amount: Money,
    }

    #[derive(Debug, Deserialize)]
    struct PageQuery {
        page: u32,
    }

    fn json_request(body: &'static str) -> Request {
        let Ok(req) = axum::http::Request::builder()
            .method("POST")
            .uri("/api/withdraw")
            .header("content-type", "application/json")
            .body(Body::from(body))
        else {
            panic!("request");
        };
        req
    }

    #[tokio::test]
    async fn bad_amount_is_invalid_request() {
        let Err(err) = ApiJson::<AmountBody>::from_request(json_request(r#"{"amount":"abc"}"#), &()).await
        else {
            panic!("bad amount accepted");
        };
        assert!(matches!(err, GatewayError::InvalidRequest(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn good_body_passes_through() {
        let Ok(ApiJson(body)) =
            ApiJson::<AmountBody>::from_request(json_request(r#"{"amount":"12.50"}"#), &()).await
        else {
            panic!("body rejected");
        };
        assert_eq!(body.amount, Money::from_cents(1_250));
    }

    fn parts(uri: &str) -> Parts {
        let Ok(req) = axum::http::Request::builder().uri(uri).body(()) else {
            panic!("request");
        };
        req.into_parts().0
    }

    #[tokio::test]
    async fn query_parses_or_is_invalid_request() {
        let mut good = parts("/api/rooms?page=3");
        let Ok(ApiQuery(query)) = ApiQuery::<PageQuery>::from_request_parts(&mut good, &()).await
        else {
            panic!("query rejected");
        };
        assert_eq!(query.page, 3);

        let mut bad = parts("/api/rooms?page=minus-one");
        let result = ApiQuery::<PageQuery>::from_request_parts(&mut bad, &()).await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }
}
