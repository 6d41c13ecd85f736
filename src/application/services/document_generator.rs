use std::path::Path;

use async_trait::async_trait;

use crate::{application::error::ApplicationError, domain::models::layout::Placement};

#[async_trait]
pub trait DocumentGenerator: Send + Sync {
    /// Renders the image at `image_path` into a single-page document written
    /// to `output_path`. Resolves only once the output is fully flushed to
    /// disk, so the caller may read it immediately afterwards.
    async fn generate(
        &self,
        image_path: &Path,
        output_path: &Path,
    ) -> Result<Placement, ApplicationError>;
}
