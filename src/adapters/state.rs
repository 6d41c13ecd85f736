use axum::extract::FromRef;
use std::sync::Arc;

use crate::{application::services::DocumentGenerator, services::TempStorage};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub storage: Arc<TempStorage>,
    pub document_generator: Arc<dyn DocumentGenerator>,
}
