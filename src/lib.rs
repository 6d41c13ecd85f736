//! HTTP service that turns one uploaded image into a one-page PDF download.
//!
//! `POST /convert` takes a multipart body with a file field named `image`
//! and answers with `converted.pdf`. Every temporary file a request creates
//! is removed before the request's resources are released, whether the
//! conversion succeeds, fails, or the client disconnects mid-download.

pub mod adapters;
pub mod application;
pub mod domain;
pub mod services;
