//! Utility functions

use crate::errors::SkyliftError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::sync::broadcast;

/// Version information for the tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Cooldown options for exponential backoff
#[derive(Debug, Clone)]
pub struct CooldownOptions {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for CooldownOptions {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(300), // 5 minutes
            multiplier: 2.0,
        }
    }
}

/// Calculate exponential backoff delay
pub fn calc_exp_backoff(options: &CooldownOptions, attempt: u32) -> Duration {
    let delay_secs = options.base_delay.as_secs_f64() * options.multiplier.powi(attempt as i32);
    let capped_delay = delay_secs.min(options.max_delay.as_secs_f64());
    Duration::from_secs_f64(capped_delay)
}

/// A bounded retry schedule for waits against external systems
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub cooldown: CooldownOptions,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            cooldown: CooldownOptions::default(),
        }
    }
}

/// Drive `op` under a retry policy until it yields a value.
///
/// `op` returns `Ok(Some(value))` when the wait is over, `Ok(None)` to keep
/// waiting, or an error to abort immediately. Exhausting the policy yields
/// a `GaveUp` error carrying the attempt count; a shutdown signal received
/// between attempts cancels the wait.
pub async fn wait_until<T, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    shutdown: &mut broadcast::Receiver<()>,
    mut op: F,
) -> Result<T, SkyliftError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>, SkyliftError>>,
{
    for attempt in 0..policy.max_attempts {
        if let Some(value) = op(attempt).await? {
            return Ok(value);
        }

        if attempt + 1 < policy.max_attempts {
            let delay = calc_exp_backoff(&policy.cooldown, attempt);
            tracing::debug!(
                "{} not ready, retrying in {:?} ({}/{})",
                what,
                delay,
                attempt + 1,
                policy.max_attempts
            );
            tokio::select! {
                _ = shutdown.recv() => {
                    return Err(SkyliftError::ShutdownError(format!("{what} interrupted")));
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    Err(SkyliftError::GaveUp {
        attempts: policy.max_attempts,
        message: what.to_string(),
    })
}

/// Generate a random UUID v4
pub fn generate_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Timestamp slug for image names, e.g. "2026-08-22T14-03-59"
pub fn timestamp_slug() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string()
}

/// Calculate SHA256 hash of data
pub fn sha256_hash(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Hex encoding utilities
mod hex {
    const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";

    pub fn encode(data: impl AsRef<[u8]>) -> String {
        let data = data.as_ref();
        let mut result = String::with_capacity(data.len() * 2);
        for byte in data {
            result.push(HEX_CHARS[(byte >> 4) as usize] as char);
            result.push(HEX_CHARS[(byte & 0x0f) as usize] as char);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exp_backoff() {
        let options = CooldownOptions::default();

        assert_eq!(calc_exp_backoff(&options, 0), Duration::from_secs(1));
        assert_eq!(calc_exp_backoff(&options, 1), Duration::from_secs(2));
        assert_eq!(calc_exp_backoff(&options, 2), Duration::from_secs(4));
        assert_eq!(calc_exp_backoff(&options, 10), Duration::from_secs(300)); // Capped at max
    }

    #[test]
    fn test_sha256_hash() {
        let hash = sha256_hash(b"hello world");
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_timestamp_slug_shape() {
        let slug = timestamp_slug();
        assert_eq!(slug.len(), 19);
        assert_eq!(&slug[4..5], "-");
        assert_eq!(&slug[10..11], "T");
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            cooldown: CooldownOptions {
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
                multiplier: 2.0,
            },
        }
    }

    #[tokio::test]
    async fn test_wait_until_succeeds_mid_schedule() {
        let (_tx, mut rx) = broadcast::channel(1);
        let policy = fast_policy(5);

        let result = wait_until(&policy, "thing", &mut rx, |attempt| async move {
            if attempt >= 2 {
                Ok(Some(attempt))
            } else {
                Ok(None)
            }
        })
        .await;

        assert_eq!(result.ok(), Some(2));
    }

    #[tokio::test]
    async fn test_wait_until_gives_up_after_max_attempts() {
        let (_tx, mut rx) = broadcast::channel(1);
        let policy = fast_policy(3);

        let result: Result<(), _> =
            wait_until(&policy, "thing", &mut rx, |_| async { Ok(None) }).await;

        match result {
            Err(SkyliftError::GaveUp { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected GaveUp, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_wait_until_propagates_errors() {
        let (_tx, mut rx) = broadcast::channel(1);
        let policy = fast_policy(5);

        let result: Result<(), _> = wait_until(&policy, "thing", &mut rx, |_| async {
            Err(SkyliftError::CloudError("boom".into()))
        })
        .await;

        assert!(matches!(result, Err(SkyliftError::CloudError(_))));
    }

    #[tokio::test]
    async fn test_wait_until_cancelled_by_shutdown() {
        let (tx, mut rx) = broadcast::channel(1);
        let policy = RetryPolicy {
            max_attempts: 5,
            cooldown: CooldownOptions {
                base_delay: Duration::from_secs(30),
                max_delay: Duration::from_secs(30),
                multiplier: 1.0,
            },
        };

        tx.send(()).ok();
        let result: Result<(), _> =
            wait_until(&policy, "thing", &mut rx, |_| async { Ok(None) }).await;

        assert!(matches!(result, Err(SkyliftError::ShutdownError(_))));
    }
}
