use std::sync::Arc;

use emotion_ai::EmotionModel;
use emotion_store::AdminService;

use crate::ApiError;

/// Shared, read-only handler state built once at startup.
///
/// Either half may be missing when its artifacts or credentials failed to
/// load; the routes that need it then answer 500.
#[derive(Clone, Default)]
pub struct AppState {
    model: Option<Arc<EmotionModel>>,
    admin: Option<Arc<AdminService>>,
}

impl AppState {
    pub fn new(model: Option<Arc<EmotionModel>>, admin: Option<Arc<AdminService>>) -> Self {
        Self { model, admin }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn has_admin(&self) -> bool {
        self.admin.is_some()
    }

    pub(crate) fn model(&self) -> Result<&EmotionModel, ApiError> {
        self.model.as_deref().ok_or(ApiError::ModelUnavailable)
    }

    pub(crate) fn admin(&self) -> Result<&AdminService, ApiError> {
        self.admin.as_deref().ok_or(ApiError::AdminUnavailable)
    }
}
