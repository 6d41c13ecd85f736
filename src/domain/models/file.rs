/// Filename every generated document is presented under.
pub const DOWNLOAD_FILENAME: &str = "converted.pdf";
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Prefix shared by every temporary artifact this service writes. Files in
/// the upload directory without it are never touched.
pub const ARTIFACT_PREFIX: &str = "img2pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    UploadedImage,
    GeneratedDocument,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::UploadedImage => "upload",
            ArtifactKind::GeneratedDocument => "pdf",
        }
    }
}
