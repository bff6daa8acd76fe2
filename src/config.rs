//! Exchange configuration.

use std::path::PathBuf;

/// Configuration for the exchange server.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    /// Interface to listen on.
    pub host: String,
    /// TCP port to listen on.
    pub port: u16,
    /// UTC offset in hours for message timestamps (east positive).
    pub utc_offset_hours: i32,
    /// Directory for the append-only market logs.
    pub log_dir: PathBuf,
    /// Symbol stamped on BBO broadcasts.
    pub stock: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
            utc_offset_hours: -8,
            log_dir: PathBuf::from("market_logs"),
            stock: "AMAZGOOG".to_string(),
        }
    }
}

impl ExchangeConfig {
    /// Defaults overridden by `EXCHANGE_HOST`, `EXCHANGE_PORT`,
    /// `EXCHANGE_UTC_OFFSET`, `EXCHANGE_LOG_DIR` and `EXCHANGE_STOCK`.
    /// Unparseable values keep the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(host) = std::env::var("EXCHANGE_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("EXCHANGE_PORT") {
            if let Ok(port) = port.parse() {
                config.port = port;
            }
        }
        if let Ok(offset) = std::env::var("EXCHANGE_UTC_OFFSET") {
            if let Ok(offset) = offset.parse() {
                config.utc_offset_hours = offset;
            }
        }
        if let Ok(dir) = std::env::var("EXCHANGE_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }
        if let Ok(stock) = std::env::var("EXCHANGE_STOCK") {
            config.stock = stock;
        }
        config
    }

    /// The listen address as `host:port`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
