//! API request/response models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for registering a file with the index.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RegisterFileRequest {
    /// Absolute path, or a path relative to the library root.
    pub path: String,
}
