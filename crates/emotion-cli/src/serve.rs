//! `emotion serve`: load model and credentials, then run the HTTP server.

use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;
use emotion_ai::EmotionModel;
use emotion_api::AppState;
use emotion_store::{AdminService, CREDENTIALS_ENV, Credentials, FirebaseAuth, FirestoreClient};
use tracing::{error, info, warn};

#[derive(Args)]
pub struct ServeArgs {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value = "5000")]
    pub port: u16,

    /// Directory holding vectorizer.json, emotion_model.json and label_encoder.json
    #[arg(long, env = "EMOTION_MODEL_DIR", default_value = ".")]
    pub model_dir: PathBuf,

    /// Credentials file, used when FIREBASE_CREDENTIALS is unset
    #[arg(
        long,
        env = "FIREBASE_CREDENTIALS_FILE",
        default_value = "firebase_credentials.json"
    )]
    pub credentials_file: PathBuf,

    #[arg(
        long,
        env = "FIRESTORE_URL",
        default_value = emotion_store::firestore::DEFAULT_BASE_URL
    )]
    pub firestore_url: String,

    #[arg(
        long,
        env = "IDENTITY_URL",
        default_value = emotion_store::identity::DEFAULT_BASE_URL
    )]
    pub identity_url: String,
}

pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    info!("emotion v{}", env!("CARGO_PKG_VERSION"));
    let inline_credentials = std::env::var(CREDENTIALS_ENV).ok();
    let state = build_state(&args, inline_credentials.as_deref());

    info!(host = %args.host, port = args.port, "listening");
    HttpServer::new(move || {
        App::new()
            .wrap(emotion_api::cors())
            .app_data(web::Data::new(state.clone()))
            .configure(emotion_api::configure)
    })
    .bind((args.host.as_str(), args.port))
    .with_context(|| format!("binding {}:{}", args.host, args.port))?
    .run()
    .await
    .context("running HTTP server")?;

    info!("server stopped");
    Ok(())
}

/// Load whatever can be loaded. A missing model or missing credentials only
/// disables the routes that need them.
///
/// `inline_credentials` is the credentials JSON from the environment; it wins
/// over `args.credentials_file`.
pub fn build_state(args: &ServeArgs, inline_credentials: Option<&str>) -> AppState {
    let model = match EmotionModel::load(&args.model_dir) {
        Ok(model) => {
            info!(
                dir = %args.model_dir.display(),
                vocabulary = model.vectorizer().vocabulary_size(),
                classes = model.labels().len(),
                classifier = model.classifier().kind(),
                "emotion model loaded"
            );
            Some(Arc::new(model))
        }
        Err(e) => {
            error!(
                dir = %args.model_dir.display(),
                error = %e,
                "failed to load emotion model"
            );
            None
        }
    };

    let admin = match Credentials::resolve(inline_credentials, &args.credentials_file) {
        Ok(creds) => {
            if let Some(warning) = token_warning(&creds, Utc::now()) {
                warn!(expires_at = ?creds.expires_at, "{warning}");
            }
            info!(project = %creds.project_id, "admin store configured");
            let store = Arc::new(FirestoreClient::new(&args.firestore_url, &creds));
            let identity = Arc::new(FirebaseAuth::new(&args.identity_url, &creds));
            Some(Arc::new(AdminService::new(store, identity)))
        }
        Err(e) => {
            error!(error = %e, "failed to load document-store credentials");
            None
        }
    };

    AppState::new(model, admin)
}

/// Why the live services would refuse these credentials, if they would.
fn token_warning(creds: &Credentials, now: DateTime<Utc>) -> Option<&'static str> {
    if creds.access_token.is_none() {
        Some(
            "credentials carry no access token; admin routes only work against the \
             local emulators and will be rejected by the live services",
        )
    } else if creds.is_expired(now) {
        Some("access token has expired; admin routes will be rejected by the live services")
    } else {
        None
    }
}
