//! Object storage and CDN models

use serde::{Deserialize, Serialize};

/// Request to set a bucket-wide ACL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetBucketAclRequest {
    pub acl: String,
}

/// Request to invalidate cached paths on a CDN distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvalidationRequest {
    /// Absolute paths relative to the distribution root
    pub paths: Vec<String>,

    /// Idempotency token for the batch
    pub caller_reference: String,
}

/// An accepted invalidation batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invalidation {
    pub id: String,
    pub status: String,
}
