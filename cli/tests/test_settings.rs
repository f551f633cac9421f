//! Conf file round-trip tests

use skylift::filesys::file::File;
use skylift::storage::settings::{load_settings, save_settings};

fn full_conf() -> serde_json::Value {
    serde_json::json!({
        "key": "AKFAKEFAKEFAKE",
        "secret": "fake-secret",
        "repo": "svn://code.example.com/site",
        "endpoint": "https://cloud.skylift.dev/api/v1",
        "deploy": {
            "production": [
                {
                    "base": "ami-1aad5273",
                    "size": "m1.small",
                    "groups": ["default", "web"],
                    "key_pair": "ec2.example",
                    "name": "web",
                    "init": ["sudo apt-get -y install nginx"],
                    "update": ["sudo service nginx reload"],
                    "url": "/status",
                    "host": "old.cloud.test",
                    "image": "img-0001",
                    "balancer": {
                        "name": "web-lb",
                        "zones": ["zone-a", "zone-b"],
                        "listeners": [
                            { "port": 443, "instance_port": 8443, "protocol": "HTTPS" }
                        ],
                        "health": {
                            "target": "HTTP:8080/health",
                            "interval": 10,
                            "timeout": 3,
                            "healthy_threshold": 2,
                            "unhealthy_threshold": 4
                        },
                        "dns_name": "web-lb.lb.cloud.test"
                    },
                    "autoscale": {
                        "group": "web-fleet",
                        "zones": ["zone-a"],
                        "min": 2,
                        "max": 8,
                        "trigger": {
                            "measure": "CPUUtilization",
                            "lower_threshold": 25.0,
                            "upper_threshold": 75.0,
                            "period": 120,
                            "breach_duration": 600,
                            "scale_down_by": -2,
                            "scale_up_by": 4
                        }
                    },
                    "assets": {
                        "bucket": "site-static",
                        "prefix": "assets",
                        "expires_days": 30
                    },
                    "cdn": { "distribution": "dist-4242" }
                }
            ]
        }
    })
}

#[tokio::test]
async fn test_host_edit_preserves_every_other_field() {
    let dir = tempfile::tempdir().unwrap();
    let conf = File::new(dir.path().join("build.json"));
    conf.write_string(&serde_json::to_string_pretty(&full_conf()).unwrap())
        .await
        .unwrap();

    let mut settings = load_settings(&conf).await.unwrap();
    settings.deploy.get_mut("production").unwrap()[0].host =
        Some("fresh.cloud.test".to_string());
    save_settings(&conf, &settings).await.unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&conf.read_string().await.unwrap()).unwrap();

    let mut expected = full_conf();
    expected["deploy"]["production"][0]["host"] = serde_json::json!("fresh.cloud.test");
    assert_eq!(written, expected);
}

#[tokio::test]
async fn test_missing_optional_fields_stay_missing() {
    let dir = tempfile::tempdir().unwrap();
    let conf = File::new(dir.path().join("build.json"));
    conf.write_string(
        &serde_json::to_string_pretty(&serde_json::json!({
            "key": "AKFAKEFAKEFAKE",
            "secret": "fake-secret",
            "deploy": {
                "default": [
                    { "base": "ami-1aad5273", "key_pair": "ec2.example", "name": "web" }
                ]
            }
        }))
        .unwrap(),
    )
    .await
    .unwrap();

    let settings = load_settings(&conf).await.unwrap();
    save_settings(&conf, &settings).await.unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&conf.read_string().await.unwrap()).unwrap();
    let machine = &written["deploy"]["default"][0];

    // Unset options are not serialized as nulls
    assert!(machine.get("host").is_none());
    assert!(machine.get("url").is_none());
    assert!(machine.get("balancer").is_none());
    assert!(machine.get("image").is_none());

    // Defaults are materialized for the operator to edit
    assert_eq!(machine["size"], "t1.micro");
    assert_eq!(written["endpoint"], "https://cloud.skylift.dev/api/v1");
}

#[tokio::test]
async fn test_bad_conf_is_rejected_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let conf = File::new(dir.path().join("build.json"));
    conf.write_string(
        &serde_json::to_string_pretty(&serde_json::json!({
            "key": "",
            "secret": "fake-secret",
            "deploy": {}
        }))
        .unwrap(),
    )
    .await
    .unwrap();

    assert!(load_settings(&conf).await.is_err());
}
