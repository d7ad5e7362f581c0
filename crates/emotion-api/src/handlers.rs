//! Route handlers.

use actix_web::{HttpResponse, web};
use emotion_core::UserUpdate;
use emotion_store::{update_fields, validate_uid};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::{ApiError, AppState, RUNNING_MESSAGE};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteUserRequest {
    #[serde(default)]
    uid: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    uid: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": RUNNING_MESSAGE }))
}

pub async fn predict(
    state: web::Data<AppState>,
    body: web::Json<PredictRequest>,
) -> Result<HttpResponse, ApiError> {
    let text = body
        .text
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::InvalidInput("No text provided".into()))?;

    let prediction = state.model()?.predict(text)?;
    debug!(
        emotion = %prediction.emotion,
        confidence = prediction.confidence,
        "prediction"
    );
    Ok(HttpResponse::Ok().json(prediction))
}

pub async fn get_users(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let users = state.admin()?.list_users().await?;
    Ok(HttpResponse::Ok().json(users))
}

pub async fn delete_user(
    state: web::Data<AppState>,
    body: web::Json<DeleteUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let uid = validate_uid(&body.uid)?;
    let outcome = state.admin()?.delete_user(uid).await?;
    info!(
        uid,
        entries = outcome.deleted_history_entries,
        "user deleted via admin API"
    );
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("User {uid} deleted successfully"),
        "deleted_history_entries": outcome.deleted_history_entries,
    })))
}

pub async fn update_user(
    state: web::Data<AppState>,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let uid = validate_uid(&body.uid)?;
    let update = UserUpdate {
        name: body.name,
        role: body.role,
    };
    // Bad input is a 400 whether or not the store is configured.
    update_fields(&update)?;
    state.admin()?.update_user(uid, &update).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("User {uid} updated successfully"),
    })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::http::header::ContentType;
    use actix_web::{App, test};
    use emotion_ai::EmotionModel;
    use emotion_ai::training::{TrainingParams, TrainingSample, train};
    use emotion_store::AdminService;
    use emotion_store::memory::{MemoryIdentity, MemoryStore};
    use serde_json::{Map, Value};

    use super::*;
    use crate::{configure, cors};

    fn sample(text: &str, emotion: &str) -> TrainingSample {
        TrainingSample {
            text: text.into(),
            emotion: emotion.into(),
        }
    }

    fn model() -> Arc<EmotionModel> {
        let corpus = vec![
            sample("I am so happy today!", "joy"),
            sample("What a happy wonderful day", "joy"),
            sample("I love this, it makes me smile", "joy"),
            sample("I feel sad and lonely", "sadness"),
            sample("Such a sad and gloomy evening", "sadness"),
            sample("I am furious and angry at you", "anger"),
            sample("This makes me so angry", "anger"),
        ];
        Arc::new(train(&corpus, &TrainingParams::default()).unwrap().model)
    }

    fn fields(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    fn store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.insert("users", "u1", fields(json!({"name": "Ada", "role": "user"})));
        store.insert("users", "u2", fields(json!({"name": "Bob"})));
        store.insert("users/u1/history", "n1", fields(json!({"text": "so happy"})));
        store.insert("history", "g1", fields(json!({"uid": "u1"})));
        store.insert("history", "g2", fields(json!({"uid": "u2"})));
        store
    }

    fn full_state(store: Arc<MemoryStore>) -> AppState {
        let identity = Arc::new(MemoryIdentity::with_accounts(["u1", "u2"]));
        let admin = Arc::new(AdminService::new(store, identity));
        AppState::new(Some(model()), Some(admin))
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .wrap(cors())
                    .app_data(web::Data::new($state))
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn index_reports_liveness() {
        let app = app!(AppState::default());
        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"message": "Emotion Recognition API is running!"}));
    }

    #[actix_web::test]
    async fn predict_returns_known_emotion() {
        let state = full_state(store());
        let app = app!(state);
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(json!({"text": "I am so happy today!"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["emotion"], "joy");
        let confidence = body["confidence"].as_f64().unwrap();
        assert!(confidence > 0.0 && confidence <= 1.0);
    }

    #[actix_web::test]
    async fn predict_rejects_missing_or_blank_text() {
        let app = app!(full_state(store()));
        let payloads = [
            json!({}),
            json!({"text": ""}),
            json!({"text": "   "}),
            json!({"text": null}),
        ];
        for payload in payloads {
            let req = test::TestRequest::post()
                .uri("/predict")
                .set_json(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, json!({"error": "No text provided"}));
        }
    }

    #[actix_web::test]
    async fn malformed_json_is_bad_request() {
        let app = app!(full_state(store()));
        let req = test::TestRequest::post()
            .uri("/predict")
            .insert_header(ContentType::json())
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn predict_without_model_is_server_error() {
        let app = app!(AppState::default());
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(json!({"text": "hello there"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "Internal server error"}));
    }

    #[actix_web::test]
    async fn get_users_lists_records() {
        let app = app!(full_state(store()));
        let req = test::TestRequest::get().uri("/admin/get_users").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body,
            json!([
                {"uid": "u1", "name": "Ada", "role": "user"},
                {"uid": "u2", "name": "Bob"}
            ])
        );
    }

    #[actix_web::test]
    async fn admin_without_store_is_server_error() {
        let app = app!(AppState::new(Some(model()), None));
        let req = test::TestRequest::get().uri("/admin/get_users").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn delete_user_cascades() {
        let store = store();
        let app = app!(full_state(store.clone()));
        let req = test::TestRequest::post()
            .uri("/admin/delete_user")
            .set_json(json!({"uid": "u1"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body,
            json!({"message": "User u1 deleted successfully", "deleted_history_entries": 2})
        );
        assert!(store.get("users", "u1").is_none());
        assert!(store.get("history", "g2").is_some());
    }

    #[actix_web::test]
    async fn delete_user_requires_uid() {
        let app = app!(full_state(store()));
        let req = test::TestRequest::post()
            .uri("/admin/delete_user")
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn delete_user_store_failure_is_server_error() {
        let store = store();
        store.fail_deletes_in("history");
        let app = app!(full_state(store.clone()));
        let req = test::TestRequest::post()
            .uri("/admin/delete_user")
            .set_json(json!({"uid": "u1"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // The user document was still removed.
        assert!(store.get("users", "u1").is_none());
    }

    #[actix_web::test]
    async fn update_user_writes_fields() {
        let store = store();
        let app = app!(full_state(store.clone()));
        let req = test::TestRequest::post()
            .uri("/admin/update_user")
            .set_json(json!({"uid": "u2", "role": "admin"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"message": "User u2 updated successfully"}));
        assert_eq!(store.get("users", "u2").unwrap()["role"], "admin");
    }

    #[actix_web::test]
    async fn update_user_without_fields_is_bad_request() {
        let store = store();
        let app = app!(full_state(store.clone()));
        let req = test::TestRequest::post()
            .uri("/admin/update_user")
            .set_json(json!({"uid": "u1", "name": ""}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "No fields to update"}));
        assert_eq!(store.get("users", "u1").unwrap()["name"], "Ada");
    }

    #[actix_web::test]
    async fn admin_input_is_validated_before_store_lookup() {
        let app = app!(AppState::default());
        let cases = [
            ("/admin/update_user", json!({"uid": "u1"}), "No fields to update"),
            ("/admin/update_user", json!({"name": "X"}), "uid is required"),
            ("/admin/delete_user", json!({}), "uid is required"),
            ("/admin/delete_user", json!({"uid": "  "}), "uid is required"),
        ];
        for (uri, payload, message) in cases {
            let req = test::TestRequest::post()
                .uri(uri)
                .set_json(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, json!({"error": message}));
        }
    }

    #[actix_web::test]
    async fn path_like_uid_is_bad_request() {
        let store = store();
        let app = app!(full_state(store.clone()));
        let req = test::TestRequest::post()
            .uri("/admin/delete_user")
            .set_json(json!({"uid": "u1/history/n1"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(store.delete_log().is_empty());
        assert!(store.get("users/u1/history", "n1").is_some());
    }

    #[actix_web::test]
    async fn update_missing_user_is_server_error() {
        let app = app!(full_state(store()));
        let req = test::TestRequest::post()
            .uri("/admin/update_user")
            .set_json(json!({"uid": "ghost", "name": "Nobody"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn cors_allows_any_origin() {
        let app = app!(AppState::default());
        let req = test::TestRequest::get()
            .uri("/")
            .insert_header(("Origin", "http://mobile.example"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("access-control-allow-origin").unwrap(),
            "http://mobile.example"
        );
    }
}
