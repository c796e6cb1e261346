//! `[serve]` section configuration for the local gate preview.

use super::{defaults, error::ConfigError};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// `[serve]` section in sitegate.toml.
///
/// `sitegate serve` answers every request with the gate's verdict, so the
/// port here is where admin redirects and 401s can be tried by hand.
///
/// # Example
/// ```toml
/// [serve]
/// interface = "0.0.0.0"
/// port = 3000
/// watch = false          # keep the manifest loaded at startup
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// IP address to bind. Host names are not resolved.
    #[serde(default = "defaults::serve::interface")]
    #[educe(Default = defaults::serve::interface())]
    pub interface: String,

    /// First port tried; later ones are probed when it is taken.
    #[serde(default = "defaults::serve::port")]
    #[educe(Default = defaults::serve::port())]
    pub port: u16,

    /// Swap in the rebuilt manifest's known paths without restarting.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub watch: bool,
}

impl ServeConfig {
    /// Parsed bind address.
    pub fn interface_addr(&self) -> Result<IpAddr, ConfigError> {
        self.interface.parse().map_err(|_| {
            ConfigError::Validation(format!(
                "[serve.interface] must be an IP address, got `{}`",
                self.interface
            ))
        })
    }
}
