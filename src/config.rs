use std::time::Duration;

use anyhow::{Result, Context, bail};
use url::Url;


/// Default TCP port of the bridge's command channel.
pub const DEFAULT_PORT: u16 = 10102;

/// Default bound on each individual prompt or response read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Maximum number of transactions in flight against one bridge.
pub const MAX_CONCURRENT_TRANSACTIONS: usize = 3;


/// Connection settings for a bridge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeConfig {
    pub host: String,

    pub port: u16,

    /// Applied separately to the prompt read and the response read.
    pub read_timeout: Duration,

    /// Query the swing mode of each unit. Doubles the round-trips per unit.
    pub swing_support: bool,
}

impl BridgeConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            swing_support: false,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn with_swing_support(mut self, swing_support: bool) -> Self {
        self.swing_support = swing_support;
        self
    }

    /// Build a config from a `tcp://host[:port][?swing=true&timeout_ms=500]` URL.
    ///
    /// `coolmaster://` is accepted as an alias of `tcp://`.
    pub fn from_url(url: &Url) -> Result<Self> {
        match url.scheme() {
            "tcp" | "coolmaster" => {},
            other => bail!("url scheme {other} not supported"),
        }

        let host = url.host_str()
            .with_context(|| format!("a host must be specified in the url: {url}"))?;

        let mut config = BridgeConfig::new(host)
            .with_port(url.port().unwrap_or(DEFAULT_PORT));

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "swing" => {
                    let swing = value.parse()
                        .with_context(|| format!("invalid swing flag {value:?} in url: {url}"))?;
                    config = config.with_swing_support(swing);
                },
                "timeout_ms" => {
                    let millis = value.parse()
                        .with_context(|| format!("invalid timeout_ms {value:?} in url: {url}"))?;
                    config = config.with_read_timeout(Duration::from_millis(millis));
                },
                other => bail!("unknown url parameter {other} in url: {url}"),
            }
        }

        Ok(config)
    }
}
