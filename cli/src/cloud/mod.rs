//! Provider control plane client and API surface

pub mod autoscale;
pub mod balancer;
pub mod cdn;
pub mod client;
pub mod compute;
pub mod objects;

use async_trait::async_trait;
use cloud_api::models::compute::{
    CreateImageRequest, Image, Instance, KeyPair, RunInstanceRequest, SecurityGroup,
};
use cloud_api::models::scaling::{
    Balancer, CreateAutoscaleGroupRequest, CreateBalancerRequest, CreateLaunchConfigRequest,
    CreateTriggerRequest,
};
use cloud_api::models::storage::{CreateInvalidationRequest, Invalidation};

use crate::cloud::client::CloudClient;
use crate::cloud::objects::PutObjectOptions;
use crate::errors::SkyliftError;

/// Everything the drivers need from the provider.
///
/// All calls are remote and may fail transiently. Callers own retry
/// scheduling; implementations report each outcome exactly once.
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// Launch a new instance
    async fn run_instance(&self, request: &RunInstanceRequest) -> Result<Instance, SkyliftError>;

    /// Fetch the current description of an instance
    async fn describe_instance(&self, instance_id: &str) -> Result<Instance, SkyliftError>;

    /// List all instances on the account
    async fn list_instances(&self) -> Result<Vec<Instance>, SkyliftError>;

    /// Look up the instance behind a public DNS name, if any
    async fn find_instance_by_dns(&self, dns: &str) -> Result<Option<Instance>, SkyliftError>;

    /// Attach a Name tag to an instance
    async fn tag_instance(&self, instance_id: &str, name: &str) -> Result<(), SkyliftError>;

    /// Terminate an instance
    async fn terminate_instance(&self, instance_id: &str) -> Result<(), SkyliftError>;

    /// Capture a machine image from a running instance
    async fn create_image(&self, request: &CreateImageRequest) -> Result<Image, SkyliftError>;

    /// Create a named key pair, returning its private material
    async fn create_key_pair(&self, name: &str) -> Result<KeyPair, SkyliftError>;

    /// List all key pairs on the account
    async fn list_key_pairs(&self) -> Result<Vec<KeyPair>, SkyliftError>;

    /// List all security groups on the account
    async fn list_security_groups(&self) -> Result<Vec<SecurityGroup>, SkyliftError>;

    /// Fetch a balancer by name, or None if it does not exist
    async fn describe_balancer(&self, name: &str) -> Result<Option<Balancer>, SkyliftError>;

    /// Create a load balancer
    async fn create_balancer(
        &self,
        request: &CreateBalancerRequest,
    ) -> Result<Balancer, SkyliftError>;

    /// Register a launch configuration
    async fn create_launch_config(
        &self,
        request: &CreateLaunchConfigRequest,
    ) -> Result<(), SkyliftError>;

    /// Create an autoscaling group
    async fn create_autoscale_group(
        &self,
        request: &CreateAutoscaleGroupRequest,
    ) -> Result<(), SkyliftError>;

    /// Create a metric trigger driving an autoscaling group
    async fn create_scaling_trigger(
        &self,
        request: &CreateTriggerRequest,
    ) -> Result<(), SkyliftError>;

    /// Create a bucket if it does not already exist
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), SkyliftError>;

    /// Mark every object in a bucket world readable
    async fn set_bucket_public(&self, bucket: &str) -> Result<(), SkyliftError>;

    /// Upload an object under the given key
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        options: &PutObjectOptions,
    ) -> Result<(), SkyliftError>;

    /// Submit a batch invalidation against a distribution
    async fn create_invalidation(
        &self,
        distribution: &str,
        request: &CreateInvalidationRequest,
    ) -> Result<Invalidation, SkyliftError>;
}

#[async_trait]
impl CloudApi for CloudClient {
    async fn run_instance(&self, request: &RunInstanceRequest) -> Result<Instance, SkyliftError> {
        CloudClient::run_instance(self, request).await
    }

    async fn describe_instance(&self, instance_id: &str) -> Result<Instance, SkyliftError> {
        CloudClient::describe_instance(self, instance_id).await
    }

    async fn list_instances(&self) -> Result<Vec<Instance>, SkyliftError> {
        CloudClient::list_instances(self).await
    }

    async fn find_instance_by_dns(&self, dns: &str) -> Result<Option<Instance>, SkyliftError> {
        CloudClient::find_instance_by_dns(self, dns).await
    }

    async fn tag_instance(&self, instance_id: &str, name: &str) -> Result<(), SkyliftError> {
        CloudClient::tag_instance(self, instance_id, name).await
    }

    async fn terminate_instance(&self, instance_id: &str) -> Result<(), SkyliftError> {
        CloudClient::terminate_instance(self, instance_id).await
    }

    async fn create_image(&self, request: &CreateImageRequest) -> Result<Image, SkyliftError> {
        CloudClient::create_image(self, request).await
    }

    async fn create_key_pair(&self, name: &str) -> Result<KeyPair, SkyliftError> {
        CloudClient::create_key_pair(self, name).await
    }

    async fn list_key_pairs(&self) -> Result<Vec<KeyPair>, SkyliftError> {
        CloudClient::list_key_pairs(self).await
    }

    async fn list_security_groups(&self) -> Result<Vec<SecurityGroup>, SkyliftError> {
        CloudClient::list_security_groups(self).await
    }

    async fn describe_balancer(&self, name: &str) -> Result<Option<Balancer>, SkyliftError> {
        CloudClient::describe_balancer(self, name).await
    }

    async fn create_balancer(
        &self,
        request: &CreateBalancerRequest,
    ) -> Result<Balancer, SkyliftError> {
        CloudClient::create_balancer(self, request).await
    }

    async fn create_launch_config(
        &self,
        request: &CreateLaunchConfigRequest,
    ) -> Result<(), SkyliftError> {
        CloudClient::create_launch_config(self, request).await
    }

    async fn create_autoscale_group(
        &self,
        request: &CreateAutoscaleGroupRequest,
    ) -> Result<(), SkyliftError> {
        CloudClient::create_autoscale_group(self, request).await
    }

    async fn create_scaling_trigger(
        &self,
        request: &CreateTriggerRequest,
    ) -> Result<(), SkyliftError> {
        CloudClient::create_scaling_trigger(self, request).await
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<(), SkyliftError> {
        CloudClient::ensure_bucket(self, bucket).await
    }

    async fn set_bucket_public(&self, bucket: &str) -> Result<(), SkyliftError> {
        CloudClient::set_bucket_public(self, bucket).await
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        options: &PutObjectOptions,
    ) -> Result<(), SkyliftError> {
        CloudClient::put_object(self, bucket, key, body, options).await
    }

    async fn create_invalidation(
        &self,
        distribution: &str,
        request: &CreateInvalidationRequest,
    ) -> Result<Invalidation, SkyliftError> {
        CloudClient::create_invalidation(self, distribution, request).await
    }
}
