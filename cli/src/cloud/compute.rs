//! Compute API extensions for CloudClient

use cloud_api::models::compute::{
    CreateImageRequest, CreateKeyPairRequest, Image, Instance, KeyPair, RunInstanceRequest,
    SecurityGroup, Tag, TagInstanceRequest,
};
use serde::Deserialize;

use crate::cloud::client::CloudClient;
use crate::errors::SkyliftError;

/// Response for instance listing endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceListResponse {
    pub instances: Vec<Instance>,
}

/// Response for the key pair listing endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct KeyPairListResponse {
    pub key_pairs: Vec<KeyPair>,
}

/// Response for the security group listing endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityGroupListResponse {
    pub security_groups: Vec<SecurityGroup>,
}

impl CloudClient {
    /// Launch a new instance
    pub async fn run_instance(&self, request: &RunInstanceRequest) -> Result<Instance, SkyliftError> {
        self.post("/compute/instances", request).await
    }

    /// Fetch the current description of an instance
    pub async fn describe_instance(&self, instance_id: &str) -> Result<Instance, SkyliftError> {
        self.get(&format!("/compute/instances/{}", instance_id)).await
    }

    /// List all instances on the account
    pub async fn list_instances(&self) -> Result<Vec<Instance>, SkyliftError> {
        let response: InstanceListResponse = self.get("/compute/instances").await?;
        Ok(response.instances)
    }

    /// Look up the instance behind a public DNS name, if any
    pub async fn find_instance_by_dns(&self, dns: &str) -> Result<Option<Instance>, SkyliftError> {
        let response: InstanceListResponse = self
            .get(&format!("/compute/instances?dns-name={}", dns))
            .await?;
        Ok(response.instances.into_iter().next())
    }

    /// Attach a Name tag to an instance
    pub async fn tag_instance(&self, instance_id: &str, name: &str) -> Result<(), SkyliftError> {
        let request = TagInstanceRequest {
            tags: vec![Tag {
                key: "Name".to_string(),
                value: name.to_string(),
            }],
        };
        let _: serde_json::Value = self
            .post(&format!("/compute/instances/{}/tags", instance_id), &request)
            .await?;
        Ok(())
    }

    /// Terminate an instance
    pub async fn terminate_instance(&self, instance_id: &str) -> Result<(), SkyliftError> {
        self.delete(&format!("/compute/instances/{}", instance_id)).await
    }

    /// Capture a machine image from a running instance
    pub async fn create_image(&self, request: &CreateImageRequest) -> Result<Image, SkyliftError> {
        self.post("/compute/images", request).await
    }

    /// Create a named key pair, returning its private material
    pub async fn create_key_pair(&self, name: &str) -> Result<KeyPair, SkyliftError> {
        let request = CreateKeyPairRequest {
            name: name.to_string(),
        };
        self.post("/compute/key-pairs", &request).await
    }

    /// List all key pairs on the account
    pub async fn list_key_pairs(&self) -> Result<Vec<KeyPair>, SkyliftError> {
        let response: KeyPairListResponse = self.get("/compute/key-pairs").await?;
        Ok(response.key_pairs)
    }

    /// List all security groups on the account
    pub async fn list_security_groups(&self) -> Result<Vec<SecurityGroup>, SkyliftError> {
        let response: SecurityGroupListResponse = self.get("/compute/security-groups").await?;
        Ok(response.security_groups)
    }
}
