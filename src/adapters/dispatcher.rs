use std::{
    pin::Pin,
    task::{Context, Poll},
};

use axum::{
    body::{Body, Bytes},
    http::{header, StatusCode},
    response::Response,
};
use futures::Stream;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use crate::{
    application::error::ApplicationError,
    domain::models::file::{ArtifactKind, PDF_MIME_TYPE},
    services::TempArtifact,
};

/// Response body that owns every artifact of the request. The artifacts are
/// deleted when the body is dropped, which hyper does after the last chunk is
/// written, after a write error, and when the client goes away.
pub struct ArtifactStream {
    inner: ReaderStream<File>,
    finished: bool,
    artifacts: Vec<TempArtifact>,
}

impl ArtifactStream {
    pub fn new(file: File, artifacts: Vec<TempArtifact>) -> Self {
        Self {
            inner: ReaderStream::new(file),
            finished: false,
            artifacts,
        }
    }
}

impl Stream for ArtifactStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let polled = Pin::new(&mut self.inner).poll_next(cx);
        match &polled {
            Poll::Ready(None) => self.finished = true,
            Poll::Ready(Some(Err(e))) => warn!("Reading document for download failed: {}", e),
            _ => {}
        }
        polled
    }
}

impl Drop for ArtifactStream {
    fn drop(&mut self) {
        let kinds: Vec<ArtifactKind> = self.artifacts.iter().map(TempArtifact::kind).collect();
        if self.finished {
            info!("Download complete, releasing {:?}", kinds);
        } else {
            warn!("Download ended early, releasing {:?}", kinds);
        }
    }
}

/// Streams `document` back as an attachment named `filename`. `document` and
/// `companions` live exactly as long as the response body.
pub async fn dispatch_download(
    document: TempArtifact,
    companions: impl IntoIterator<Item = TempArtifact>,
    filename: &str,
) -> Result<Response, ApplicationError> {
    let file = File::open(document.path()).await.map_err(|e| {
        ApplicationError::InternalError(format!(
            "Cannot open {}: {}",
            document.path().display(),
            e
        ))
    })?;
    let length = file
        .metadata()
        .await
        .map_err(|e| ApplicationError::InternalError(format!("Cannot stat document: {}", e)))?
        .len();

    let mut artifacts = vec![document];
    artifacts.extend(companions);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, PDF_MIME_TYPE)
        .header(header::CONTENT_LENGTH, length)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from_stream(ArtifactStream::new(file, artifacts)))
        .map_err(|e| ApplicationError::InternalError(format!("Failed to build response: {}", e)))
}
