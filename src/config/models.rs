use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub downloader: DownloaderConfig,
}

impl Config {
    /// True when no shared secret is configured and requests are not checked
    pub fn is_open_mode(&self) -> bool {
        self.auth.password.is_none()
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Largest accepted submission body, after decompression
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
    #[serde(default = "default_max_links")]
    pub max_links: usize,
    /// Directory of static UI files served for unmatched routes, `ui/`
    /// when present
    #[serde(default = "default_ui_dir")]
    pub ui_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_payload_bytes: default_max_payload_bytes(),
            max_links: default_max_links(),
            ui_dir: default_ui_dir(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 3000))
}

fn default_max_payload_bytes() -> usize {
    1024 * 1024 // 1 MiB
}

fn default_max_links() -> usize {
    500
}

fn default_ui_dir() -> Option<PathBuf> {
    existing_dir(PathBuf::from("ui"))
}

fn existing_dir(path: PathBuf) -> Option<PathBuf> {
    path.is_dir().then_some(path)
}

/// Shared-secret authorization
#[derive(Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// External download tool settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloaderConfig {
    #[serde(default = "default_program")]
    pub program: String,
    /// Extra arguments placed before `--output-path`
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            output_path: default_output_path(),
        }
    }
}

fn default_program() -> String {
    "gytmdl".to_string()
}

fn default_output_path() -> PathBuf {
    PathBuf::from("./Music")
}
