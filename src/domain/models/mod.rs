pub mod file;
pub mod layout;
