//! CDN API extensions for CloudClient

use cloud_api::models::storage::{CreateInvalidationRequest, Invalidation};

use crate::cloud::client::CloudClient;
use crate::errors::SkyliftError;

impl CloudClient {
    /// Submit a batch invalidation against a distribution
    pub async fn create_invalidation(
        &self,
        distribution: &str,
        request: &CreateInvalidationRequest,
    ) -> Result<Invalidation, SkyliftError> {
        self.post(
            &format!("/cdn/distributions/{}/invalidations", distribution),
            request,
        )
        .await
    }
}
