//! Account inventory report

use std::collections::BTreeMap;

use cloud_api::models::compute::{Instance, InstanceState};

use crate::cloud::CloudApi;
use crate::errors::SkyliftError;

/// Print the account map: key pairs, security groups, and instances
/// grouped by the image they run.
pub async fn print_map(cloud: &dyn CloudApi) -> Result<(), SkyliftError> {
    println!("Keys:");
    for key in cloud.list_key_pairs().await? {
        println!("{}\t{}", key.name, key.fingerprint);
    }

    println!();
    println!("Groups:");
    for group in cloud.list_security_groups().await? {
        println!("{}", group.name);

        let mut by_grant: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for rule in &group.rules {
            for grant in &rule.grants {
                by_grant.entry(grant.clone()).or_default().push(format!(
                    "{}:[{}-{}]",
                    rule.protocol, rule.from_port, rule.to_port
                ));
            }
        }

        for (grant, rules) in by_grant {
            println!("\t{}", grant);
            for rule in rules {
                println!("\t\t{}", rule);
            }
        }
    }

    println!();
    println!("Instances:");
    let mut by_image: BTreeMap<String, Vec<Instance>> = BTreeMap::new();
    for instance in cloud.list_instances().await? {
        by_image
            .entry(instance.image.clone())
            .or_default()
            .push(instance);
    }

    for (image, instances) in by_image {
        println!("{}", image);
        for instance in instances {
            let detail = match instance.state {
                InstanceState::Running => instance.public_dns.as_deref().unwrap_or("-").to_string(),
                _ => instance.state_reason.as_deref().unwrap_or("-").to_string(),
            };
            println!("\t{}: {}", instance.state, detail);
        }
    }

    Ok(())
}
