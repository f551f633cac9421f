//! Deployment operations

pub mod assets;
pub mod build;
pub mod inventory;
pub mod keypair;
pub mod scale;
pub mod shell;
pub mod update;

use std::path::PathBuf;

use crate::errors::SkyliftError;
use crate::storage::settings::{Machine, Settings};

/// Working set of one deployment operation.
///
/// The environment's machines are copied out of the settings for the
/// duration of the run and mutated there; `commit` writes the result
/// back. Nothing else sees half-finished machine records.
pub struct DeploymentRun {
    pub env: String,
    pub source: PathBuf,
    pub machines: Vec<Machine>,
}

impl DeploymentRun {
    /// Copy the named environment's machines out of the settings
    pub fn checkout(
        settings: &Settings,
        env: &str,
        source: PathBuf,
    ) -> Result<Self, SkyliftError> {
        let machines = settings
            .deploy
            .get(env)
            .cloned()
            .ok_or_else(|| SkyliftError::DeployError(format!("deploy {} not found", env)))?;

        if machines.is_empty() {
            return Err(SkyliftError::DeployError(format!(
                "deploy {} has no machines",
                env
            )));
        }

        Ok(Self {
            env: env.to_string(),
            source,
            machines,
        })
    }

    /// Write the mutated machines back into the settings
    pub fn commit(self, settings: &mut Settings) {
        settings.deploy.insert(self.env, self.machines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_env(env: &str, machines: Vec<Machine>) -> Settings {
        let mut settings = Settings {
            key: "k".to_string(),
            secret: "s".to_string(),
            ..Settings::default()
        };
        settings.deploy.insert(env.to_string(), machines);
        settings
    }

    fn machine(name: &str) -> Machine {
        serde_json::from_value(serde_json::json!({
            "base": "ami-1aad5273",
            "key_pair": "ec2.example",
            "name": name
        }))
        .expect("machine")
    }

    #[test]
    fn test_checkout_unknown_env() {
        let settings = settings_with_env("default", vec![machine("web")]);
        let result = DeploymentRun::checkout(&settings, "staging", PathBuf::from("/src"));

        match result {
            Err(SkyliftError::DeployError(message)) => {
                assert_eq!(message, "deploy staging not found")
            }
            other => panic!("expected DeployError, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_checkout_empty_env() {
        let settings = settings_with_env("default", vec![]);
        let result = DeploymentRun::checkout(&settings, "default", PathBuf::from("/src"));

        assert!(matches!(result, Err(SkyliftError::DeployError(_))));
    }

    #[test]
    fn test_commit_writes_machines_back() {
        let mut settings = settings_with_env("default", vec![machine("web")]);
        let mut run =
            DeploymentRun::checkout(&settings, "default", PathBuf::from("/src")).expect("checkout");

        run.machines[0].host = Some("host.cloud.test".to_string());
        run.commit(&mut settings);

        assert_eq!(
            settings.deploy["default"][0].host.as_deref(),
            Some("host.cloud.test")
        );
    }
}
