//! Decentralized storage seam. Uploads return the content URI that later
//! steps embed in metadata.

pub mod http;

use crate::submission::ImageFile;
use anyhow::Result;
use futures::future::BoxFuture;
use serde_json::Value;

pub use http::HttpUploader;

pub trait StorageUploader: Send + Sync {
    /// Stores raw image bytes and returns their content URI.
    fn upload<'a>(&'a self, file: &'a ImageFile) -> BoxFuture<'a, Result<String>>;

    /// Stores a JSON document and returns its content URI.
    fn upload_json<'a>(&'a self, document: &'a Value) -> BoxFuture<'a, Result<String>>;
}
