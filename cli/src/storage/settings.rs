//! Deployment settings file management

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::SkyliftError;
use crate::filesys::file::File;

/// Deployment settings, loaded from the conf file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Provider access key id
    pub key: String,

    /// Provider secret key
    pub secret: String,

    /// Repository URL for tag-based checkouts
    #[serde(default)]
    pub repo: Option<String>,

    /// Provider control plane base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Environments: name to ordered machine list
    #[serde(default)]
    pub deploy: BTreeMap<String, Vec<Machine>>,
}

fn default_endpoint() -> String {
    "https://cloud.skylift.dev/api/v1".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            key: String::new(),
            secret: String::new(),
            repo: None,
            endpoint: default_endpoint(),
            deploy: BTreeMap::new(),
        }
    }
}

/// One machine record: the unit of provisioning and deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    /// Base image id the instance boots from
    pub base: String,

    /// Instance size
    #[serde(default = "default_size")]
    pub size: String,

    /// Security groups
    #[serde(default = "default_groups")]
    pub groups: Vec<String>,

    /// Key pair name; the private key lives at deploy/<key_pair>.pem
    /// under the source tree
    pub key_pair: String,

    /// Display name, also used as the instance Name tag
    pub name: String,

    /// Commands run once after a new instance becomes reachable
    #[serde(default)]
    pub init: Vec<String>,

    /// Commands run after each code push
    #[serde(default)]
    pub update: Vec<String>,

    /// Public URL path opened in a browser after an update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Assigned public host, recorded after provisioning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Image id recorded by the last update snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Load balancer attachment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balancer: Option<BalancerSpec>,

    /// Autoscaling attachment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoscale: Option<AutoscaleSpec>,

    /// Static asset sync target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<AssetSpec>,

    /// CDN distribution for cache invalidation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdn: Option<CdnSpec>,
}

fn default_size() -> String {
    "t1.micro".to_string()
}

fn default_groups() -> Vec<String> {
    vec!["default".to_string()]
}

/// Load balancer attachment for a machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancerSpec {
    /// Balancer name
    pub name: String,

    /// Availability zones the balancer spans
    #[serde(default)]
    pub zones: Vec<String>,

    /// Port forwardings
    #[serde(default = "default_listeners")]
    pub listeners: Vec<ListenerSpec>,

    /// Health check parameters
    #[serde(default)]
    pub health: HealthCheckSpec,

    /// Balancer DNS name, recorded after creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
}

/// One balancer port forwarding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerSpec {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_port")]
    pub instance_port: u16,

    #[serde(default = "default_protocol")]
    pub protocol: String,
}

fn default_port() -> u16 {
    80
}

fn default_protocol() -> String {
    "HTTP".to_string()
}

fn default_listeners() -> Vec<ListenerSpec> {
    vec![ListenerSpec {
        port: 80,
        instance_port: 80,
        protocol: "HTTP".to_string(),
    }]
}

/// Balancer health check parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckSpec {
    #[serde(default = "default_health_target")]
    pub target: String,

    #[serde(default = "default_health_interval")]
    pub interval: u32,

    #[serde(default = "default_health_timeout")]
    pub timeout: u32,

    #[serde(default = "default_healthy_threshold")]
    pub healthy_threshold: u32,

    #[serde(default = "default_unhealthy_threshold")]
    pub unhealthy_threshold: u32,
}

fn default_health_target() -> String {
    "HTTP:80/".to_string()
}

fn default_health_interval() -> u32 {
    30
}

fn default_health_timeout() -> u32 {
    5
}

fn default_healthy_threshold() -> u32 {
    3
}

fn default_unhealthy_threshold() -> u32 {
    5
}

impl Default for HealthCheckSpec {
    fn default() -> Self {
        Self {
            target: default_health_target(),
            interval: default_health_interval(),
            timeout: default_health_timeout(),
            healthy_threshold: default_healthy_threshold(),
            unhealthy_threshold: default_unhealthy_threshold(),
        }
    }
}

/// Autoscaling attachment for a machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoscaleSpec {
    /// Group name; defaults to "<machine-name>-group"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Availability zones the group spans
    #[serde(default)]
    pub zones: Vec<String>,

    #[serde(default = "default_min_size")]
    pub min: u32,

    #[serde(default = "default_max_size")]
    pub max: u32,

    /// CPU-utilization scaling trigger
    #[serde(default)]
    pub trigger: TriggerSpec,
}

fn default_min_size() -> u32 {
    1
}

fn default_max_size() -> u32 {
    4
}

/// Scaling trigger parameters, overridable per field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerSpec {
    #[serde(default = "default_measure")]
    pub measure: String,

    #[serde(default = "default_lower_threshold")]
    pub lower_threshold: f64,

    #[serde(default = "default_upper_threshold")]
    pub upper_threshold: f64,

    /// Measurement period in seconds
    #[serde(default = "default_period")]
    pub period: u32,

    /// Seconds a threshold must stay breached before scaling
    #[serde(default = "default_breach_duration")]
    pub breach_duration: u32,

    /// Capacity delta on a lower-threshold breach
    #[serde(default = "default_scale_down_by")]
    pub scale_down_by: i32,

    /// Capacity delta on an upper-threshold breach
    #[serde(default = "default_scale_up_by")]
    pub scale_up_by: i32,
}

fn default_measure() -> String {
    "CPUUtilization".to_string()
}

fn default_lower_threshold() -> f64 {
    20.0
}

fn default_upper_threshold() -> f64 {
    80.0
}

fn default_period() -> u32 {
    60
}

fn default_breach_duration() -> u32 {
    300
}

fn default_scale_down_by() -> i32 {
    -1
}

fn default_scale_up_by() -> i32 {
    2
}

impl Default for TriggerSpec {
    fn default() -> Self {
        Self {
            measure: default_measure(),
            lower_threshold: default_lower_threshold(),
            upper_threshold: default_upper_threshold(),
            period: default_period(),
            breach_duration: default_breach_duration(),
            scale_down_by: default_scale_down_by(),
            scale_up_by: default_scale_up_by(),
        }
    }
}

/// Static asset sync target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetSpec {
    /// Bucket name
    pub bucket: String,

    /// Key prefix inside the bucket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Cache lifetime for uploaded objects, in days
    #[serde(default = "default_expires_days")]
    pub expires_days: u32,
}

fn default_expires_days() -> u32 {
    365
}

/// CDN distribution for cache invalidation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdnSpec {
    /// Distribution id
    pub distribution: String,
}

/// Validate settings once at load time
pub fn validate(settings: &Settings) -> Result<(), SkyliftError> {
    if settings.key.is_empty() || settings.secret.is_empty() {
        return Err(SkyliftError::ConfigError(
            "provider credentials are missing".to_string(),
        ));
    }

    Url::parse(&settings.endpoint)
        .map_err(|e| SkyliftError::ConfigError(format!("bad endpoint url: {}", e)))?;

    for (env, machines) in &settings.deploy {
        for machine in machines {
            if machine.name.is_empty() {
                return Err(SkyliftError::ConfigError(format!(
                    "a machine in deploy {} has no name",
                    env
                )));
            }
            if machine.base.is_empty() {
                return Err(SkyliftError::ConfigError(format!(
                    "{} has no base image",
                    machine.name
                )));
            }
            if machine.key_pair.is_empty() {
                return Err(SkyliftError::ConfigError(format!(
                    "{} has no key_pair",
                    machine.name
                )));
            }
            if let Some(autoscale) = &machine.autoscale {
                if autoscale.zones.is_empty() {
                    return Err(SkyliftError::ConfigError(format!(
                        "{} autoscale needs at least one zone",
                        machine.name
                    )));
                }
            }
        }
    }

    Ok(())
}

/// Load settings from the conf file and validate them
pub async fn load_settings(conf_file: &File) -> Result<Settings, SkyliftError> {
    let settings: Settings = conf_file.read_json().await?;
    validate(&settings)?;
    Ok(settings)
}

/// Save settings back to the conf file atomically
pub async fn save_settings(conf_file: &File, settings: &Settings) -> Result<(), SkyliftError> {
    let contents = serde_json::to_string_pretty(settings)?;
    conf_file.write_atomic(contents.as_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_machine_json() -> serde_json::Value {
        serde_json::json!({
            "base": "ami-1aad5273",
            "key_pair": "ec2.example",
            "name": "example"
        })
    }

    #[test]
    fn test_machine_defaults() {
        let machine: Machine = serde_json::from_value(minimal_machine_json()).expect("parse");

        assert_eq!(machine.size, "t1.micro");
        assert_eq!(machine.groups, vec!["default".to_string()]);
        assert!(machine.init.is_empty());
        assert!(machine.update.is_empty());
        assert!(machine.host.is_none());
        assert!(machine.image.is_none());
    }

    #[test]
    fn test_balancer_defaults() {
        let spec: BalancerSpec =
            serde_json::from_value(serde_json::json!({ "name": "web" })).expect("parse");

        assert_eq!(spec.listeners.len(), 1);
        assert_eq!(spec.listeners[0].port, 80);
        assert_eq!(spec.listeners[0].protocol, "HTTP");
        assert_eq!(spec.health.target, "HTTP:80/");
        assert_eq!(spec.health.interval, 30);
        assert_eq!(spec.health.timeout, 5);
        assert_eq!(spec.health.healthy_threshold, 3);
        assert_eq!(spec.health.unhealthy_threshold, 5);
        assert!(spec.dns_name.is_none());
    }

    #[test]
    fn test_trigger_defaults_overridable_per_field() {
        let spec: AutoscaleSpec = serde_json::from_value(serde_json::json!({
            "zones": ["us-east-1a"],
            "trigger": { "upper_threshold": 90.0 }
        }))
        .expect("parse");

        assert_eq!(spec.min, 1);
        assert_eq!(spec.max, 4);
        assert_eq!(spec.trigger.measure, "CPUUtilization");
        assert_eq!(spec.trigger.lower_threshold, 20.0);
        assert_eq!(spec.trigger.upper_threshold, 90.0);
        assert_eq!(spec.trigger.period, 60);
        assert_eq!(spec.trigger.breach_duration, 300);
        assert_eq!(spec.trigger.scale_down_by, -1);
        assert_eq!(spec.trigger.scale_up_by, 2);
    }

    #[test]
    fn test_validate_rejects_missing_credentials() {
        let settings = Settings {
            key: String::new(),
            secret: "s".to_string(),
            ..Settings::default()
        };

        assert!(matches!(
            validate(&settings),
            Err(SkyliftError::ConfigError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_autoscale_without_zones() {
        let mut machine: Machine = serde_json::from_value(minimal_machine_json()).expect("parse");
        machine.autoscale = Some(
            serde_json::from_value(serde_json::json!({})).expect("parse autoscale"),
        );

        let mut settings = Settings {
            key: "k".to_string(),
            secret: "s".to_string(),
            ..Settings::default()
        };
        settings.deploy.insert("default".to_string(), vec![machine]);

        let err = validate(&settings).expect_err("should reject");
        assert!(err.to_string().contains("zone"));
    }

    #[test]
    fn test_optional_fields_not_serialized_when_absent() {
        let machine: Machine = serde_json::from_value(minimal_machine_json()).expect("parse");
        let value = serde_json::to_value(&machine).expect("serialize");
        let object = value.as_object().expect("object");

        assert!(!object.contains_key("host"));
        assert!(!object.contains_key("image"));
        assert!(!object.contains_key("url"));
        assert!(!object.contains_key("balancer"));
    }
}
