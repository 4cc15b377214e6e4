use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use rand::RngCore;
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

const DEFAULT_PORT: u16 = 50051;
const TOKEN_SECRET_BYTES: usize = 32;

#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("failed to read config file at {}", path.display()))]
    Read { path: PathBuf, source: std::io::Error },

    #[snafu(display("failed to parse config file at {}", path.display()))]
    Parse { path: PathBuf, source: serde_yaml::Error },

    #[snafu(display("failed to write config file at {}", path.display()))]
    Write { path: PathBuf, source: std::io::Error },

    #[snafu(display("failed to create config directory {}", path.display()))]
    CreateDir { path: PathBuf, source: std::io::Error },

    #[snafu(display("could not determine a home directory to place the default config in"))]
    NoHomeDir,
}

type Result<T, E = ConfigError> = std::result::Result<T, E>;

/// The `api_server:` section of `$HOME/.skyshift/config.yaml` (§6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Symmetric HMAC secret signing bearer tokens. Generated once at
    /// first boot and persisted, so restarting the server does not
    /// invalidate every outstanding token.
    pub secret: String,
    /// Reject updates whose body carries no `resource_version` instead of
    /// silently doing an unconditional overwrite. Defaults to `false`,
    /// matching the source's behavior (§9 open question).
    #[serde(default)]
    pub strict_updates: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub api_server: ApiServerSection,
}

impl Config {
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        let ip: IpAddr = self
            .api_server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        Ok(SocketAddr::new(ip, self.api_server.port))
    }

    /// Loads the config at `path`, generating a fresh one with a random
    /// secret if it does not exist yet — mirroring the source's
    /// lazily-bootstrapped `~/.skyflow/config.yaml`.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path).context(ReadSnafu { path: path.to_path_buf() })?;
            return serde_yaml::from_str(&contents).context(ParseSnafu { path: path.to_path_buf() });
        }

        let config = Config {
            api_server: ApiServerSection {
                host: default_host(),
                port: default_port(),
                secret: generate_secret(),
                strict_updates: false,
            },
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context(CreateDirSnafu { path: parent.to_path_buf() })?;
        }
        let serialized = serde_yaml::to_string(&config).expect("Config always serializes");
        std::fs::write(path, serialized).context(WriteSnafu { path: path.to_path_buf() })?;
        Ok(config)
    }

    pub fn default_path() -> Result<PathBuf> {
        let home = dirs_home().context(NoHomeDirSnafu)?;
        Ok(home.join(".skyshift").join("config.yaml"))
    }
}

fn generate_secret() -> String {
    let mut bytes = [0u8; TOKEN_SECRET_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes)
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_is_created_with_random_secret() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let a = Config::load_or_init(&path).unwrap();
        let b = Config::load_or_init(&path).unwrap();
        assert_eq!(a.api_server.secret, b.api_server.secret);
        assert!(!a.api_server.secret.is_empty());
    }
}
