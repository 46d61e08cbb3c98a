//! Network configuration for the Stellar SDK.
//!
//! This module resolves the supported Stellar networks to their passphrase
//! and Soroban RPC endpoint, and holds the tunables of the pipeline: HTTP
//! pooling, request retry, fees, transaction timeout and polling limits.

use crate::error::{StellarError, StellarResult};
use crate::retry::RetryConfig;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Connection reuse toward the Soroban RPC endpoint.
///
/// A client talks to a single host, so the pool stays small: a call needs
/// at most a handful of requests in flight (`read_many` being the widest).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Idle connections kept open to the RPC host (8).
    pub max_idle_per_host: usize,
    /// Idle connections are closed after this long (90s).
    pub idle_timeout: Duration,
    /// TCP keepalive interval, `None` to leave it to the OS (60s).
    pub keepalive: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 8,
            idle_timeout: Duration::from_secs(90),
            keepalive: Some(Duration::from_secs(60)),
        }
    }
}

impl PoolConfig {
    /// One idle connection, dropped quickly; for short-lived scripts.
    pub fn minimal() -> Self {
        Self {
            max_idle_per_host: 1,
            idle_timeout: Duration::from_secs(10),
            keepalive: None,
        }
    }
}

/// Controls how long and how often a submitted transaction is polled.
///
/// The defaults poll once per second for at most two minutes. Use
/// [`PollConfig::unbounded`] to poll until a terminal status with no limit.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between status queries.
    pub interval: Duration,
    /// Delay before the single retry of a poll that failed with a
    /// format-mismatch parse error.
    pub format_retry_delay: Duration,
    /// Give up after this much time spent polling.
    pub max_duration: Option<Duration>,
    /// Give up after this many polls.
    pub max_attempts: Option<u32>,
    /// Presume success after this many polls whose status could only be
    /// read as `NOT_FOUND` through repeated format-mismatch failures.
    pub presume_success_after: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            format_retry_delay: Duration::from_secs(2),
            max_duration: Some(Duration::from_secs(120)),
            max_attempts: None,
            presume_success_after: 3,
        }
    }
}

impl PollConfig {
    /// Polls until a terminal status, however long that takes.
    pub fn unbounded() -> Self {
        Self {
            max_duration: None,
            max_attempts: None,
            ..Default::default()
        }
    }

    /// Sets the delay between polls.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the delay before retrying a format-mismatch poll.
    pub fn with_format_retry_delay(mut self, delay: Duration) -> Self {
        self.format_retry_delay = delay;
        self
    }

    /// Sets the maximum time spent polling.
    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = Some(max_duration);
        self
    }

    /// Sets the maximum number of polls.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Sets how many unresolved polls lead to presumed success.
    pub fn with_presume_success_after(mut self, polls: u32) -> Self {
        self.presume_success_after = polls.max(1);
        self
    }
}

/// Known Stellar networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    /// The SDF test network
    Testnet,
    /// The public network
    Public,
}

impl Network {
    /// Returns the network passphrase.
    pub fn passphrase(&self) -> &'static str {
        match self {
            Network::Testnet => "Test SDF Network ; September 2015",
            Network::Public => "Public Global Stellar Network ; September 2015",
        }
    }

    /// Returns the default Soroban RPC endpoint.
    pub fn rpc_url(&self) -> &'static str {
        match self {
            Network::Testnet => "https://soroban-testnet.stellar.org",
            Network::Public => "https://rpc.stellar.org",
        }
    }

    /// Returns the network identifier as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Testnet => "TESTNET",
            Network::Public => "PUBLIC",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = StellarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TESTNET" => Ok(Network::Testnet),
            "PUBLIC" => Ok(Network::Public),
            _ => Err(StellarError::UnsupportedNetwork(s.to_string())),
        }
    }
}

/// A network resolved to its passphrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    network: Network,
    passphrase: &'static str,
}

impl NetworkConfig {
    /// Resolves a known network.
    pub fn new(network: Network) -> Self {
        Self {
            network,
            passphrase: network.passphrase(),
        }
    }

    /// Resolves a network identifier such as `"TESTNET"` or `"PUBLIC"`.
    ///
    /// # Errors
    ///
    /// Returns [`StellarError::UnsupportedNetwork`] for any other identifier.
    pub fn from_id(id: &str) -> StellarResult<Self> {
        Ok(Self::new(id.parse()?))
    }

    /// The network.
    pub fn network(&self) -> Network {
        self.network
    }

    /// The network passphrase.
    pub fn passphrase(&self) -> &str {
        self.passphrase
    }

    /// SHA-256 of the passphrase, mixed into every transaction hash.
    pub fn network_id(&self) -> [u8; 32] {
        flash_stellar_types::network_id(self.passphrase)
    }
}

/// Configuration for the Stellar client.
///
/// Use the builder methods to customize the configuration, or one of the
/// presets [`StellarConfig::testnet()`] and [`StellarConfig::public()`].
///
/// # Example
///
/// ```rust
/// use flash_stellar_sdk::config::{PollConfig, StellarConfig};
/// use std::time::Duration;
///
/// let config = StellarConfig::testnet()
///     .with_timeout(Duration::from_secs(30))
///     .with_poll(PollConfig::default().with_max_duration(Duration::from_secs(60)));
/// ```
#[derive(Debug, Clone)]
pub struct StellarConfig {
    pub(crate) network: NetworkConfig,
    pub(crate) rpc_url: Url,
    pub(crate) timeout: Duration,
    pub(crate) retry_config: RetryConfig,
    pub(crate) pool_config: PoolConfig,
    pub(crate) poll_config: PollConfig,
    pub(crate) base_fee: u32,
    pub(crate) transaction_timeout: Duration,
}

/// Inclusion fee per operation, in stroops.
pub const DEFAULT_BASE_FEE: u32 = 100;

/// Validity window of a built transaction.
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(60);

impl StellarConfig {
    fn preset(network: Network, retry_config: RetryConfig) -> Self {
        Self {
            network: NetworkConfig::new(network),
            rpc_url: Url::parse(network.rpc_url()).expect("valid RPC URL"),
            timeout: Duration::from_secs(30),
            retry_config,
            pool_config: PoolConfig::default(),
            poll_config: PollConfig::default(),
            base_fee: DEFAULT_BASE_FEE,
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
        }
    }

    /// Creates a configuration for the test network.
    pub fn testnet() -> Self {
        Self::preset(Network::Testnet, RetryConfig::default())
    }

    /// Creates a configuration for the public network.
    pub fn public() -> Self {
        Self::preset(Network::Public, RetryConfig::conservative())
    }

    /// Creates a configuration for a network identifier with its default endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`StellarError::UnsupportedNetwork`] for unknown identifiers.
    pub fn for_network_id(id: &str) -> StellarResult<Self> {
        Ok(match id.parse::<Network>()? {
            Network::Testnet => Self::testnet(),
            Network::Public => Self::public(),
        })
    }

    /// Creates a configuration for `network` served by a custom RPC endpoint.
    ///
    /// # Example
    ///
    /// ```rust
    /// use flash_stellar_sdk::config::{Network, StellarConfig};
    ///
    /// let config = StellarConfig::custom(Network::Testnet, "http://localhost:8000/rpc").unwrap();
    /// ```
    pub fn custom(network: Network, rpc_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            rpc_url: Url::parse(rpc_url)?,
            ..Self::preset(network, RetryConfig::default())
        })
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry configuration for transient transport failures.
    pub fn with_retry(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Disables automatic retry for RPC requests.
    pub fn without_retry(mut self) -> Self {
        self.retry_config = RetryConfig::no_retry();
        self
    }

    /// Sets the connection pool configuration.
    pub fn with_pool(mut self, pool_config: PoolConfig) -> Self {
        self.pool_config = pool_config;
        self
    }

    /// Sets the polling configuration.
    pub fn with_poll(mut self, poll_config: PollConfig) -> Self {
        self.poll_config = poll_config;
        self
    }

    /// Sets the inclusion fee per operation, in stroops.
    pub fn with_base_fee(mut self, base_fee: u32) -> Self {
        self.base_fee = base_fee;
        self
    }

    /// Sets the validity window of built transactions.
    pub fn with_transaction_timeout(mut self, timeout: Duration) -> Self {
        self.transaction_timeout = timeout;
        self
    }

    /// Returns the network.
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Returns the RPC URL.
    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the retry configuration.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }

    /// Returns the connection pool configuration.
    pub fn pool_config(&self) -> &PoolConfig {
        &self.pool_config
    }

    /// Returns the polling configuration.
    pub fn poll_config(&self) -> &PollConfig {
        &self.poll_config
    }

    /// Returns the inclusion fee per operation.
    pub fn base_fee(&self) -> u32 {
        self.base_fee
    }

    /// Returns the validity window of built transactions.
    pub fn transaction_timeout(&self) -> Duration {
        self.transaction_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_from_str() {
        assert_eq!("TESTNET".parse::<Network>().unwrap(), Network::Testnet);
        assert_eq!("public".parse::<Network>().unwrap(), Network::Public);
        let err = "FUTURENET".parse::<Network>().unwrap_err();
        assert!(matches!(err, StellarError::UnsupportedNetwork(id) if id == "FUTURENET"));
    }

    #[test]
    fn test_network_config_resolution() {
        let config = NetworkConfig::from_id("TESTNET").unwrap();
        assert_eq!(config.passphrase(), "Test SDF Network ; September 2015");
        assert_eq!(
            hex::encode(config.network_id()),
            "cee0302d59844d32bdca915c8203dd44b33fbb7edc19051ea37abedf28ecd472"
        );
        assert!(NetworkConfig::from_id("").is_err());
    }

    #[test]
    fn test_presets() {
        let testnet = StellarConfig::testnet();
        assert_eq!(testnet.network().network(), Network::Testnet);
        assert_eq!(
            testnet.rpc_url().as_str(),
            "https://soroban-testnet.stellar.org/"
        );
        assert_eq!(testnet.base_fee(), 100);
        assert_eq!(testnet.transaction_timeout(), Duration::from_secs(60));

        let public = StellarConfig::public();
        assert_eq!(
            public.network().passphrase(),
            "Public Global Stellar Network ; September 2015"
        );
        assert_eq!(public.retry_config().initial_delay(), std::time::Duration::from_millis(500));

        assert!(StellarConfig::for_network_id("MAINNET").is_err());
    }

    #[test]
    fn test_custom_config() {
        let config = StellarConfig::custom(Network::Public, "http://localhost:8000/rpc").unwrap();
        assert_eq!(config.network().network(), Network::Public);
        assert_eq!(config.rpc_url().as_str(), "http://localhost:8000/rpc");
        assert!(StellarConfig::custom(Network::Public, "not a url").is_err());
    }

    #[test]
    fn test_builder_methods() {
        let config = StellarConfig::testnet()
            .with_timeout(Duration::from_secs(5))
            .without_retry()
            .with_base_fee(200)
            .with_pool(PoolConfig::minimal());
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.retry_config().max_retries(), 0);
        assert_eq!(config.base_fee(), 200);
        assert_eq!(config.pool_config().max_idle_per_host, 1);
    }

    #[test]
    fn test_poll_config() {
        let poll = PollConfig::default();
        assert_eq!(poll.interval, Duration::from_secs(1));
        assert_eq!(poll.format_retry_delay, Duration::from_secs(2));
        assert_eq!(poll.max_duration, Some(Duration::from_secs(120)));
        assert_eq!(poll.presume_success_after, 3);

        let unbounded = PollConfig::unbounded();
        assert!(unbounded.max_duration.is_none());
        assert!(unbounded.max_attempts.is_none());
    }
}
