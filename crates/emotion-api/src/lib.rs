//! HTTP routes for prediction and user administration.

mod error;
mod handlers;
mod state;

use actix_cors::Cors;
use actix_web::web;

pub use error::ApiError;
pub use state::AppState;

/// Liveness message returned by `GET /`.
pub const RUNNING_MESSAGE: &str = "Emotion Recognition API is running!";

/// Register every route plus the JSON body configuration.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/", web::get().to(handlers::index))
        .route("/predict", web::post().to(handlers::predict))
        .service(
            web::scope("/admin")
                .route("/get_users", web::get().to(handlers::get_users))
                .route("/delete_user", web::post().to(handlers::delete_user))
                .route("/update_user", web::post().to(handlers::update_user)),
        );
}

/// Cross-origin policy: any origin, method and header.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600)
}

/// Malformed or non-JSON bodies become a 400 with an `error` field.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::InvalidInput(format!("Invalid JSON body: {err}")).into()
    })
}
