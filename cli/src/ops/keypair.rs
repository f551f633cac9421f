//! Key pair generation

use std::path::PathBuf;

use colored::Colorize;

use crate::cloud::CloudApi;
use crate::errors::SkyliftError;
use crate::filesys::file::File;

/// Create a key pair on the account and save its private key next to
/// the current directory as NAME.pem, owner-only.
pub async fn generate(cloud: &dyn CloudApi, name: &str) -> Result<PathBuf, SkyliftError> {
    let key_pair = cloud.create_key_pair(name).await?;
    let material = key_pair.material.ok_or_else(|| {
        SkyliftError::CloudError(format!(
            "key pair {} came back without private material",
            name
        ))
    })?;

    let path = std::env::current_dir()?.join(format!("{}.pem", name));
    let file = File::new(&path);
    file.write_string(&material).await?;
    file.set_permissions_600().await?;

    println!("Generated {}", path.display().to_string().cyan());
    Ok(path)
}
