use crate::access::AccessConfig;
use crate::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// Listen token that turns on local-only mode.
pub const LOCAL_TOKEN: &str = "local";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// `"local"` or an explicit `host[:port]`.
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<PathBuf>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<PathBuf>,
}

impl TlsConfig {
    /// The certificate/key pair, when both are set.
    pub fn pair(&self) -> Option<(&Path, &Path)> {
        match (&self.cert, &self.key) {
            (Some(cert), Some(key)) => Some((cert.as_path(), key.as_path())),
            _ => None,
        }
    }
}

/// Where the gateway listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenTarget {
    /// All interfaces, restricted to local-network callers.
    Local,
    Address { host: String, port: u16 },
}

impl ListenTarget {
    /// Parse a listen token. `default_port` applies when the token has no port.
    pub fn parse(token: &str, default_port: u16) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(GatewayError::config("listen target must not be empty"));
        }
        if token == LOCAL_TOKEN {
            return Ok(Self::Local);
        }

        if let Ok(addr) = token.parse::<SocketAddr>() {
            return Ok(Self::Address {
                host: addr.ip().to_string(),
                port: addr.port(),
            });
        }
        if let Ok(ip) = token.trim_start_matches('[').trim_end_matches(']').parse::<IpAddr>() {
            return Ok(Self::Address {
                host: ip.to_string(),
                port: default_port,
            });
        }

        match token.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    GatewayError::config(format!("invalid port in listen target '{token}'"))
                })?;
                if host.is_empty() {
                    return Err(GatewayError::config(format!(
                        "missing host in listen target '{token}'"
                    )));
                }
                Ok(Self::Address {
                    host: host.to_string(),
                    port,
                })
            }
            None => Ok(Self::Address {
                host: token.to_string(),
                port: default_port,
            }),
        }
    }

    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }

    /// `host:port` string suitable for binding.
    pub fn bind_address(&self, default_port: u16) -> String {
        match self {
            Self::Local => format!("0.0.0.0:{default_port}"),
            Self::Address { host, port } if host.contains(':') => format!("[{host}]:{port}"),
            Self::Address { host, port } => format!("{host}:{port}"),
        }
    }
}

fn default_listen() -> String {
    LOCAL_TOKEN.to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            api_key: None,
            tls: TlsConfig::default(),
            credentials_path: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl GatewayConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load an explicit config file, else the first one found in the standard
    /// locations, else defaults.
    /// Priority: CLI arg > CWD > XDG config > home dir
    pub fn find_and_load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::load(path);
        }

        for candidate in &config_search_paths() {
            if candidate.exists() {
                tracing::info!(path = %candidate.display(), "Loading config");
                return Self::load(candidate);
            }
        }

        Ok(Self::default())
    }

    /// Reject half-configured TLS and unparseable listen targets.
    pub fn validate(&self) -> Result<()> {
        match (&self.tls.cert, &self.tls.key) {
            (Some(_), None) => {
                return Err(GatewayError::config("TLS certificate given without a key"))
            }
            (None, Some(_)) => {
                return Err(GatewayError::config("TLS key given without a certificate"))
            }
            _ => {}
        }
        self.listen_target()?;
        Ok(())
    }

    pub fn listen_target(&self) -> Result<ListenTarget> {
        ListenTarget::parse(&self.listen, self.port)
    }

    /// Access settings for the gate, fixed for the lifetime of the process.
    pub fn access_config(&self) -> Result<AccessConfig> {
        Ok(AccessConfig::new(
            self.listen_target()?.is_local(),
            self.api_key.clone(),
        ))
    }
}

pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("qwen-gateway.toml")];

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        paths.push(PathBuf::from(xdg).join("qwen-gateway").join("config.toml"));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config").join("qwen-gateway").join("config.toml"));
        paths.push(home.join(".qwen-gateway.toml"));
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
listen = "127.0.0.1:8080"
api_key = "pw"
request_timeout_secs = 30

[tls]
cert = "cert.pem"
key = "key.pem"
"#
        )
        .unwrap();

        let config = GatewayConfig::load(f.path()).unwrap();
        assert_eq!(config.listen, "127.0.0.1:8080");
        assert_eq!(config.port, 3000);
        assert_eq!(config.api_key.as_deref(), Some("pw"));
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.tls.pair().is_some());
        config.validate().unwrap();
    }

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen_target().unwrap(), ListenTarget::Local);
        assert_eq!(
            config.access_config().unwrap(),
            AccessConfig {
                local_only: true,
                required_key: None
            }
        );
    }

    #[test]
    fn test_half_tls_pair_is_rejected() {
        let mut config = GatewayConfig::default();
        config.tls.cert = Some(PathBuf::from("cert.pem"));
        assert!(matches!(config.validate(), Err(GatewayError::Config { .. })));

        config.tls = TlsConfig {
            cert: None,
            key: Some(PathBuf::from("key.pem")),
        };
        assert!(matches!(config.validate(), Err(GatewayError::Config { .. })));
    }

    #[test]
    fn test_listen_target_parsing() {
        assert_eq!(ListenTarget::parse("local", 3000).unwrap(), ListenTarget::Local);
        assert_eq!(
            ListenTarget::parse("0.0.0.0:8080", 3000).unwrap(),
            ListenTarget::Address {
                host: "0.0.0.0".to_string(),
                port: 8080
            }
        );
        assert_eq!(
            ListenTarget::parse("localhost", 3000).unwrap(),
            ListenTarget::Address {
                host: "localhost".to_string(),
                port: 3000
            }
        );
        assert_eq!(
            ListenTarget::parse("example.com:9000", 3000).unwrap(),
            ListenTarget::Address {
                host: "example.com".to_string(),
                port: 9000
            }
        );
        assert_eq!(
            ListenTarget::parse("::1", 3000).unwrap(),
            ListenTarget::Address {
                host: "::1".to_string(),
                port: 3000
            }
        );
        assert_eq!(
            ListenTarget::parse("[::1]:4000", 3000).unwrap(),
            ListenTarget::Address {
                host: "::1".to_string(),
                port: 4000
            }
        );
        assert!(ListenTarget::parse("", 3000).is_err());
        assert!(ListenTarget::parse("host:notaport", 3000).is_err());
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(ListenTarget::Local.bind_address(3000), "0.0.0.0:3000");
        let v6 = ListenTarget::parse("[::1]:4000", 3000).unwrap();
        assert_eq!(v6.bind_address(3000), "[::1]:4000");
    }

    #[test]
    fn test_explicit_host_disables_local_only() {
        let config = GatewayConfig {
            listen: "127.0.0.1".to_string(),
            api_key: Some("pw".to_string()),
            ..GatewayConfig::default()
        };
        let access = config.access_config().unwrap();
        assert!(!access.local_only);
        assert_eq!(access.required_key.as_deref(), Some("pw"));
    }
}
