//! Command line interface

use std::path::PathBuf;

use clap::Parser;

use crate::app::options::{AppOptions, LifecycleOptions, Mode, ServerOptions};

/// Provision, deploy, and scale cloud fleets from a JSON environment map
#[derive(Parser, Debug)]
#[command(name = "skylift")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Print provider inventory: key pairs, security groups, instances
    #[arg(short, long)]
    pub map: bool,

    /// Open a shell on a machine in ENV
    #[arg(short, long)]
    pub shell: bool,

    /// Create new instances for ENV
    #[arg(short, long)]
    pub build: bool,

    /// Update existing instances in ENV
    #[arg(short, long)]
    pub update: bool,

    /// Generate key pair NAME and save NAME.pem in the working directory
    #[arg(short, long, value_name = "NAME")]
    pub key: Option<String>,

    /// Deploy environment to operate on
    #[arg(short, long, default_value = "default", value_name = "ENV")]
    pub env: String,

    /// Tag checked out when no --dir is given; "trunk" selects the trunk
    #[arg(short, long, default_value = "trunk", value_name = "TAG")]
    pub tag: String,

    /// Use DIR as the source tree instead of a checkout
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Conf file path
    #[arg(short = 'f', long, default_value = "./build.json", value_name = "FILE")]
    pub conf: PathBuf,

    /// Listen for build requests on PORT
    #[arg(short, long, value_name = "PORT")]
    pub listen: Option<u16>,

    /// Sync static/ to the configured asset bucket during updates
    #[arg(long)]
    pub s3bucket: bool,

    /// Invalidate the configured CDN distribution during updates
    #[arg(long = "cache_invalidate")]
    pub cache_invalidate: bool,

    /// Seed a fresh conf file from TEMPLATE
    #[arg(long, value_name = "TEMPLATE")]
    pub template: Option<PathBuf>,
}

impl Cli {
    /// Fold the flag surface into a single action. Only one mode runs
    /// per invocation; returns None when no action was asked for.
    pub fn into_options(self) -> Option<AppOptions> {
        let mode = if let Some(name) = self.key {
            Mode::Keypair { name }
        } else if self.map {
            Mode::Map
        } else if self.shell {
            Mode::Shell
        } else if self.listen.is_some() {
            Mode::Listen
        } else if self.build {
            Mode::Build
        } else if self.update {
            Mode::Update
        } else {
            return None;
        };

        let mut server = ServerOptions::default();
        if let Some(port) = self.listen {
            server.port = port;
        }

        Some(AppOptions {
            mode,
            conf: self.conf,
            env: self.env,
            tag: self.tag,
            dir: self.dir,
            template: self.template,
            sync_assets: self.s3bucket,
            invalidate_cache: self.cache_invalidate,
            server,
            lifecycle: LifecycleOptions::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["skylift", "--update"]);
        let options = cli.into_options().unwrap();

        assert_eq!(options.mode, Mode::Update);
        assert_eq!(options.env, "default");
        assert_eq!(options.tag, "trunk");
        assert_eq!(options.conf, PathBuf::from("./build.json"));
        assert!(!options.sync_assets);
        assert!(!options.invalidate_cache);
    }

    #[test]
    fn test_no_action_yields_none() {
        let cli = Cli::parse_from(["skylift", "-e", "prod"]);
        assert!(cli.into_options().is_none());
    }

    #[test]
    fn test_listen_sets_server_port() {
        let cli = Cli::parse_from(["skylift", "-l", "8000"]);
        let options = cli.into_options().unwrap();

        assert_eq!(options.mode, Mode::Listen);
        assert_eq!(options.server.port, 8000);
        assert_eq!(options.server.host, "0.0.0.0");
    }

    #[test]
    fn test_key_takes_precedence() {
        let cli = Cli::parse_from(["skylift", "-m", "-k", "staging"]);
        let options = cli.into_options().unwrap();

        assert_eq!(
            options.mode,
            Mode::Keypair {
                name: "staging".to_string()
            }
        );
    }

    #[test]
    fn test_update_toggles() {
        let cli = Cli::parse_from(["skylift", "-u", "--s3bucket", "--cache_invalidate"]);
        let options = cli.into_options().unwrap();

        assert_eq!(options.mode, Mode::Update);
        assert!(options.sync_assets);
        assert!(options.invalidate_cache);
    }

    #[test]
    fn test_build_with_dir_and_env() {
        let cli = Cli::parse_from(["skylift", "-b", "-e", "prod", "-d", "/srv/site"]);
        let options = cli.into_options().unwrap();

        assert_eq!(options.mode, Mode::Build);
        assert_eq!(options.env, "prod");
        assert_eq!(options.dir, Some(PathBuf::from("/srv/site")));
    }
}
