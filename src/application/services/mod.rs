mod document_generator;

pub use document_generator::DocumentGenerator;
