#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use solana_sdk::commitment_config::CommitmentLevel;

/// The top-level configuration for the `geyser-watch-connector` library.
///
/// This struct aggregates the endpoint, subscription and reconnection settings.
/// It is typically deserialized from a configuration file and passed to the
/// `StreamController` upon initialization.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub struct ConnectorConfig {
    #[cfg_attr(feature = "serde", serde(default))]
    pub endpoint: EndpointConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub subscription: SubscriptionConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub reconnect: ReconnectConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub channels: ChannelConfig,
}

/// Where the feed lives and how credentials for it are found.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", default))]
pub struct EndpointConfig {
    /// gRPC endpoint used when the endpoint environment variable is unset.
    pub url: String,
    /// Token used when the token environment variable is unset.
    pub x_token: Option<String>,
    /// Name of the environment variable holding the access token.
    pub token_env: String,
    /// Name of the environment variable that overrides `url`.
    pub endpoint_env: String,
    pub connect_timeout_secs: u64,
    /// How long the server version is waited for before subscribing without it.
    pub version_timeout_secs: u64,
    /// Upper bound for a single decoded update. Block updates can be large.
    pub max_decoding_message_size: usize,
}

/// What to subscribe to.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", default))]
pub struct SubscriptionConfig {
    /// Base-58 address of the program whose transactions and accounts are watched.
    pub program_id: String,
    #[cfg_attr(feature = "serde", serde(with = "serde_commitment"))]
    pub commitment: CommitmentLevel,
    /// Answer server pings so idle streams are not reaped.
    pub keep_alive: bool,
}

/// Reconnection behavior of the `StreamController`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", default))]
pub struct ReconnectConfig {
    /// Number of failures tolerated before the controller aborts. Capped at
    /// `u32::MAX - 1`.
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Growth factor applied to the delay after each consecutive failure.
    pub multiplier: f64,
    /// Random spread applied to each delay, as a fraction of it (0.0 disables).
    pub jitter: f64,
    pub budget: RetryBudget,
}

/// Scope of the retry counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum RetryBudget {
    /// One budget for the whole run. The counter never resets.
    #[default]
    Lifetime,
    /// The counter resets every time a subscription is established.
    PerConnection,
}

/// Defines capacities for the MPSC channels within the connector.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", default))]
pub struct ChannelConfig {
    /// The buffer capacity for outbound subscribe requests on one stream.
    pub request_buffer: usize,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:10000".to_string(),
            x_token: None,
            token_env: "X_TOKEN".to_string(),
            endpoint_env: "GEYSER_ENDPOINT".to_string(),
            connect_timeout_secs: 10,
            version_timeout_secs: 5,
            max_decoding_message_size: 64 * 1024 * 1024,
        }
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            program_id: "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P".to_string(),
            commitment: CommitmentLevel::Processed,
            keep_alive: true,
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: 2_000_000,
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
            multiplier: 2.0,
            jitter: 0.2,
            budget: RetryBudget::Lifetime,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self { request_buffer: 16 }
    }
}

#[cfg(feature = "serde")]
mod serde_commitment {

    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(c: &CommitmentLevel, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = match c {
            CommitmentLevel::Processed => "Processed",
            CommitmentLevel::Confirmed => "Confirmed",
            CommitmentLevel::Finalized => "Finalized",
        };
        serializer.serialize_str(s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<CommitmentLevel, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        match s.to_lowercase().as_str() {
            "processed" => Ok(CommitmentLevel::Processed),
            "confirmed" => Ok(CommitmentLevel::Confirmed),
            "finalized" => Ok(CommitmentLevel::Finalized),
            other => Err(serde::de::Error::unknown_variant(
                other,
                &["processed", "confirmed", "finalized"],
            )),
        }
    }
}
