use std::{path::Path, sync::Arc};

use axum::{
    extract::{multipart::MultipartError, FromRef, FromRequest, Multipart, Request},
    http::StatusCode,
};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::{
    application::error::ApplicationError,
    domain::models::file::ArtifactKind,
    services::{TempArtifact, TempStorage},
};

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

/// An uploaded image already persisted under the upload directory. Extracting
/// it parses the multipart body and streams the `image` file field to disk,
/// so handlers only ever see a complete file. The file is removed when the
/// value (or the artifact taken from it) is dropped.
#[derive(Debug)]
pub struct ImageUpload {
    artifact: TempArtifact,
    size: u64,
}

impl ImageUpload {
    pub fn path(&self) -> &Path {
        self.artifact.path()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn into_artifact(self) -> TempArtifact {
        self.artifact
    }
}

impl<S> FromRequest<S> for ImageUpload
where
    S: Send + Sync,
    Arc<TempStorage>: FromRef<S>,
{
    type Rejection = ApplicationError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let storage = Arc::<TempStorage>::from_ref(state);

        let mut multipart = Multipart::from_request(req, state).await.map_err(|e| {
            warn!("Request is not a multipart upload: {}", e);
            ApplicationError::MissingUpload
        })?;

        let mut upload: Option<ImageUpload> = None;

        while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
            // Only file parts count, text fields with the same name are ignored.
            if field.name() != Some(IMAGE_FIELD) || field.file_name().is_none() {
                continue;
            }

            if upload.is_some() {
                return Err(ApplicationError::BadRequest("Unexpected field".to_string()));
            }

            let artifact = storage.reserve(ArtifactKind::UploadedImage);
            let mut file = artifact.create().await?;
            let mut size = 0u64;

            while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                size += chunk.len() as u64;
                file.write_all(&chunk)
                    .await
                    .map_err(|e| artifact.write_error(e))?;
            }
            file.flush().await.map_err(|e| artifact.write_error(e))?;

            info!("Stored upload at {} ({} bytes)", artifact.path().display(), size);
            upload = Some(ImageUpload { artifact, size });
        }

        upload.ok_or_else(|| {
            warn!("Missing required '{}' field in upload", IMAGE_FIELD);
            ApplicationError::MissingUpload
        })
    }
}

fn multipart_error(error: MultipartError) -> ApplicationError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApplicationError::PayloadTooLarge
    } else {
        ApplicationError::BadRequest(format!("Invalid multipart data: {}", error.body_text()))
    }
}
