//! Load balancer and autoscaling models

use serde::{Deserialize, Serialize};

/// One balancer listener: external port forwarded to an instance port
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listener {
    pub port: u16,
    pub instance_port: u16,
    pub protocol: String,
}

/// Balancer health check parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Probe target, e.g. "HTTP:80/"
    pub target: String,

    /// Seconds between probes
    pub interval: u32,

    /// Probe timeout in seconds
    pub timeout: u32,

    /// Consecutive successes before an instance counts as healthy
    pub healthy_threshold: u32,

    /// Consecutive failures before an instance counts as unhealthy
    pub unhealthy_threshold: u32,
}

/// Request to create a load balancer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBalancerRequest {
    pub name: String,
    pub zones: Vec<String>,
    pub listeners: Vec<Listener>,
    pub health_check: HealthCheck,
}

/// A load balancer as reported by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balancer {
    pub name: String,
    pub dns_name: String,
    #[serde(default)]
    pub zones: Vec<String>,
}

/// Request to create a launch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLaunchConfigRequest {
    pub name: String,
    pub image: String,
    pub key_pair: String,
    pub size: String,
    pub groups: Vec<String>,
}

/// Request to create an autoscaling group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAutoscaleGroupRequest {
    pub name: String,
    pub launch_config: String,
    pub zones: Vec<String>,
    pub min_size: u32,
    pub max_size: u32,

    /// Balancer names the group registers instances with
    #[serde(default)]
    pub balancers: Vec<String>,
}

/// Request to create a metric-driven scaling trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTriggerRequest {
    pub group: String,

    /// Metric the trigger watches, e.g. "CPUUtilization"
    pub measure: String,

    pub lower_threshold: f64,
    pub upper_threshold: f64,

    /// Measurement period in seconds
    pub period: u32,

    /// Seconds a threshold must stay breached before scaling
    pub breach_duration: u32,

    /// Capacity delta on a lower-threshold breach (negative shrinks)
    pub scale_down_by: i32,

    /// Capacity delta on an upper-threshold breach
    pub scale_up_by: i32,
}
