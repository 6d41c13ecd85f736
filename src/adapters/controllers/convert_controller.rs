use axum::{extract::State, response::Response};
use tracing::info;

use crate::{
    adapters::{dispatcher::dispatch_download, middleware::ImageUpload, state::AppState},
    application::error::ApplicationError,
    domain::models::file::{ArtifactKind, DOWNLOAD_FILENAME},
};

pub struct ConvertController;

impl ConvertController {
    /// Turns the uploaded image into a one-page PDF and streams it back.
    /// POST /convert
    /// Body: multipart/form-data with a file field named `image`
    ///
    /// Both temporary files are owned by guards from here on: an error drops
    /// them, a successful response hands them to the body.
    pub async fn convert(
        State(app_state): State<AppState>,
        upload: ImageUpload,
    ) -> Result<Response, ApplicationError> {
        info!(
            "Converting {} ({} bytes)",
            upload.path().display(),
            upload.size()
        );

        let document = app_state
            .storage
            .reserve(ArtifactKind::GeneratedDocument);
        let generator = app_state.document_generator.clone();

        // The task owns the guards while the writer runs. If the client hangs
        // up now, the handler is dropped but the guards are only released
        // after the writer has finished with the output path.
        let (upload, document) = tokio::spawn(async move {
            generator
                .generate(upload.path(), document.path())
                .await?;
            Ok::<_, ApplicationError>((upload, document))
        })
        .await
        .map_err(|e| ApplicationError::InternalError(format!("Conversion task failed: {}", e)))??;

        dispatch_download(document, [upload.into_artifact()], DOWNLOAD_FILENAME).await
    }
}
