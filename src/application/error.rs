#[derive(Debug)]
pub enum ApplicationError {
    MissingUpload,
    BadRequest(String),
    PayloadTooLarge,
    GenerationFailed(String),
    InternalError(String),
}
