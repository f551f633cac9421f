//! Load balancer API extensions for CloudClient

use cloud_api::models::scaling::{Balancer, CreateBalancerRequest};

use crate::cloud::client::CloudClient;
use crate::errors::SkyliftError;

impl CloudClient {
    /// Fetch a balancer by name, or None if it does not exist
    pub async fn describe_balancer(&self, name: &str) -> Result<Option<Balancer>, SkyliftError> {
        self.get_optional(&format!("/scaling/balancers/{}", name)).await
    }

    /// Create a load balancer
    pub async fn create_balancer(
        &self,
        request: &CreateBalancerRequest,
    ) -> Result<Balancer, SkyliftError> {
        self.post("/scaling/balancers", request).await
    }
}
