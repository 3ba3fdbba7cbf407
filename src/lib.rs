//! Review image ingestion for a commerce platform
//!
//! Takes a client-submitted inline image (`data:image/...;base64,...`), stages
//! it with the platform's object storage, registers it as a managed file and
//! polls until the platform has processed it, yielding the public URL.

pub mod error;
pub mod mime;
pub mod models;
pub mod payload;
pub mod pipeline;
pub mod platform;
pub mod transport;

pub use error::{Error, Result};
pub use pipeline::{upload_review_image, ImagePipeline};
