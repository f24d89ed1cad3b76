use super::AppState;
use super::error::ApiError;
use super::wire::{InferBody, RequestBody};
use crate::engine::{EngineFactory, GatewayStatus};
use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde_json::{Value, json};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn status<F: EngineFactory>(State(state): State<AppState<F>>) -> Json<GatewayStatus> {
    Json(state.router.gateway().status())
}

pub async fn create<F: EngineFactory>(
    State(state): State<AppState<F>>,
    body: Result<Json<RequestBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let (tenant, content) = body.into_parts()?;
    state.call(move |router| router.create(&tenant, &content)).await?;
    Ok(Json(json!({})))
}

pub async fn learn<F: EngineFactory>(
    State(state): State<AppState<F>>,
    body: Result<Json<RequestBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let (tenant, content) = body.into_parts()?;
    state.call(move |router| router.learn(&tenant, &content)).await?;
    Ok(Json(json!({})))
}

pub async fn infer<F: EngineFactory>(
    State(state): State<AppState<F>>,
    body: Result<Json<RequestBody>, JsonRejection>,
) -> Result<Json<InferBody>, ApiError> {
    let Json(body) = body?;
    let (tenant, content) = body.into_parts()?;
    let response = state.call(move |router| router.infer(&tenant, &content)).await?;
    Ok(Json(InferBody { message: response.message }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ready;
    use crate::engine::testing::MockFactory;
    use crate::server::wire::WireItem;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{Request, StatusCode, header};
    use axum::response::IntoResponse;

    fn state() -> AppState<MockFactory> {
        AppState::new(ready(MockFactory::new(), "CCGBANK").unwrap(), 4)
    }

    fn body(tenant: &str, items: &[&str]) -> Result<Json<RequestBody>, JsonRejection> {
        Ok(Json(RequestBody {
            tenant_id: tenant.to_string(),
            content: items.iter().map(|t| WireItem::text(*t)).collect(),
        }))
    }

    async fn raw_body(content_type: &str, raw: &'static str) -> Result<Json<RequestBody>, JsonRejection> {
        let request = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(raw))
            .unwrap();
        Json::<RequestBody>::from_request(request, &()).await
    }

    #[tokio::test]
    async fn create_then_infer_round_trip() {
        let state = state();
        let Json(ack) = create(State(state.clone()), body("u1", &["html"])).await.unwrap();
        assert_eq!(ack, json!({}));

        let Json(out) = infer(State(state.clone()), body("u1", &["A.", "B."])).await.unwrap();
        assert_eq!(out.message, "[A.]\n[B.]");

        let Json(status) = status(State(state)).await;
        assert_eq!(status.sessions.len(), 1);
        assert_eq!(status.sessions[0].format, "HTML");
    }

    #[tokio::test]
    async fn learn_always_acknowledges() {
        let Json(ack) = learn(State(state()), body("", &[])).await.unwrap();
        assert_eq!(ack, json!({}));
    }

    #[tokio::test]
    async fn boundary_errors_map_to_status_codes() {
        let state = state();

        let err = infer(State(state.clone()), body("u1", &[])).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = create(State(state.clone()), body("u1", &["bogus"])).await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.kind, "unsupported_format_error");

        let err = create(State(state.clone()), body("u2", &["missing"])).await.unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);

        let err = infer(State(state), body("u1", &["FAIL"])).await.unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn unreadable_bodies_get_the_json_error_shape() {
        let state = state();

        let err = infer(State(state.clone()), raw_body("application/json", "{not json").await).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.kind, "invalid_argument");

        let err = create(State(state.clone()), raw_body("text/plain", "{}").await).await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let response = learn(State(state), raw_body("application/json", "[1, 2]").await).await.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["error"]["type"], "invalid_argument");
        assert_eq!(value["error"]["code"], "422");
        assert!(value["error"]["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(value) = health().await;
        assert_eq!(value["status"], "ok");
    }
}
