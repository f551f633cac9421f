//! First-run creation of the conf file.
//!
//! When the conf path does not exist we walk the operator through the
//! minimum viable settings (credentials plus an optional repo), seed the
//! rest from a template file or built-in defaults, and hand the result
//! to `$EDITOR` for touch-up.

use std::collections::BTreeMap;
use std::path::Path;

use colored::Colorize;
use dialoguer::{Input, Password};
use tokio::process::Command;
use tracing::warn;

use crate::errors::SkyliftError;
use crate::filesys::file::File;
use crate::storage::settings::{Machine, Settings};

const DEFAULT_BASE_IMAGE: &str = "ami-1aad5273";
const DEFAULT_KEY_PAIR: &str = "ec2.example";

/// Ensure the conf file exists, creating it interactively when it
/// does not.
pub async fn ensure_conf(conf_file: &File, template: Option<&Path>) -> Result<(), SkyliftError> {
    if conf_file.exists().await {
        return Ok(());
    }
    println!(
        "{} not found, creating",
        conf_file.path().display().to_string().cyan()
    );

    let mut seed = match template {
        Some(path) => File::new(path).read_json::<Settings>().await?,
        None => default_settings(),
    };

    let answers = tokio::task::spawn_blocking(prompt_credentials)
        .await
        .map_err(|e| SkyliftError::Internal(format!("prompt task failed: {}", e)))??;
    seed.key = answers.key;
    seed.secret = answers.secret;
    seed.repo = answers.repo;

    let body = serde_json::to_string_pretty(&seed)?;
    conf_file.write_string(&body).await?;

    if let Some(editor) = std::env::var_os("EDITOR") {
        if !editor.is_empty() {
            let command = format!("{} {}", editor.to_string_lossy(), conf_file.path().display());
            let result = Command::new("bash").args(["-c", &command]).status().await;
            if let Err(e) = result {
                warn!("Could not open $EDITOR on {}: {}", conf_file.path().display(), e);
            }
        }
    }
    if seed.repo.is_none() {
        warn!("-t deployments will not work without a defined repo");
    }
    Ok(())
}

struct Answers {
    key: String,
    secret: String,
    repo: Option<String>,
}

/// Blocking prompt loop. Access key and secret are required, the repo
/// may stay empty.
fn prompt_credentials() -> Result<Answers, SkyliftError> {
    let key = loop {
        let value: String = Input::new()
            .with_prompt("Access key")
            .allow_empty(true)
            .interact_text()
            .map_err(interrupted)?;
        let value = value.trim().to_string();
        if !value.is_empty() {
            break value;
        }
    };

    let secret = loop {
        let value = Password::new()
            .with_prompt("Secret key")
            .allow_empty_password(true)
            .interact()
            .map_err(interrupted)?;
        let value = value.trim().to_string();
        if !value.is_empty() {
            break value;
        }
    };

    let repo: String = Input::new()
        .with_prompt("Repository")
        .allow_empty(true)
        .interact_text()
        .map_err(interrupted)?;
    let repo = repo.trim().to_string();

    Ok(Answers {
        key,
        secret,
        repo: (!repo.is_empty()).then_some(repo),
    })
}

fn interrupted(e: dialoguer::Error) -> SkyliftError {
    SkyliftError::ConfigError(format!("conf file creation interrupted: {}", e))
}

/// Settings seeded into a fresh conf file: one `default` environment
/// holding a single micro machine.
fn default_settings() -> Settings {
    let machine = Machine {
        base: DEFAULT_BASE_IMAGE.to_string(),
        size: "t1.micro".to_string(),
        groups: vec!["default".to_string()],
        key_pair: DEFAULT_KEY_PAIR.to_string(),
        name: "example".to_string(),
        init: Vec::new(),
        update: Vec::new(),
        url: Some("/".to_string()),
        host: None,
        image: None,
        balancer: None,
        autoscale: None,
        assets: None,
        cdn: None,
    };
    let mut deploy = BTreeMap::new();
    deploy.insert("default".to_string(), vec![machine]);
    Settings {
        deploy,
        ..Settings::default()
    }
}
