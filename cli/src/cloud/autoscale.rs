//! Autoscaling API extensions for CloudClient

use cloud_api::models::scaling::{
    CreateAutoscaleGroupRequest, CreateLaunchConfigRequest, CreateTriggerRequest,
};

use crate::cloud::client::CloudClient;
use crate::errors::SkyliftError;

impl CloudClient {
    /// Register a launch configuration
    pub async fn create_launch_config(
        &self,
        request: &CreateLaunchConfigRequest,
    ) -> Result<(), SkyliftError> {
        let _: serde_json::Value = self.post("/scaling/launch-configs", request).await?;
        Ok(())
    }

    /// Create an autoscaling group
    pub async fn create_autoscale_group(
        &self,
        request: &CreateAutoscaleGroupRequest,
    ) -> Result<(), SkyliftError> {
        let _: serde_json::Value = self.post("/scaling/groups", request).await?;
        Ok(())
    }

    /// Create a metric trigger driving an autoscaling group
    pub async fn create_scaling_trigger(
        &self,
        request: &CreateTriggerRequest,
    ) -> Result<(), SkyliftError> {
        let _: serde_json::Value = self.post("/scaling/triggers", request).await?;
        Ok(())
    }
}
