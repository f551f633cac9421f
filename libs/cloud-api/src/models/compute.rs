//! Compute models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Instance lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstanceState::Pending => "pending",
            InstanceState::Running => "running",
            InstanceState::ShuttingDown => "shutting-down",
            InstanceState::Terminated => "terminated",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// A compute instance as reported by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// Instance ID
    pub id: String,

    /// Base image the instance was launched from
    pub image: String,

    /// Instance size
    pub size: String,

    /// Current lifecycle state
    pub state: InstanceState,

    /// Public DNS name, present once the instance is running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_dns: Option<String>,

    /// Human-readable reason for the current state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_reason: Option<String>,

    /// Key pair the instance was launched with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_pair: Option<String>,

    /// Security groups
    #[serde(default)]
    pub groups: Vec<String>,

    /// Launch timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launched_at: Option<String>,
}

/// Request to launch a new instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInstanceRequest {
    pub image: String,
    pub size: String,
    pub groups: Vec<String>,
    pub key_pair: String,
}

/// Name/value tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// Request to tag an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagInstanceRequest {
    pub tags: Vec<Tag>,
}

/// Request to snapshot an instance into a new image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateImageRequest {
    pub instance_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A machine image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub name: String,
    pub state: String,
}

/// Request to create a key pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateKeyPairRequest {
    pub name: String,
}

/// A named key pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyPair {
    pub name: String,
    pub fingerprint: String,

    /// PEM-encoded private key, only returned at creation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

/// One ingress rule of a security group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityRule {
    pub protocol: String,
    pub from_port: i64,
    pub to_port: i64,

    /// Source grants (CIDR blocks or group names)
    pub grants: Vec<String>,
}

/// A security group and its rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub rules: Vec<SecurityRule>,
}
