mod error;
mod pdf_generator;
mod temp_storage;

pub use error::{GenerationError, StorageError};
pub use pdf_generator::PdfDocumentGenerator;
pub use temp_storage::{TempArtifact, TempStorage};

use std::sync::Arc;

use crate::{application::services::DocumentGenerator, domain::models::layout::PageLayout};

pub fn create_document_generator() -> Arc<dyn DocumentGenerator> {
    Arc::new(PdfDocumentGenerator::new(PageLayout::default()))
}
