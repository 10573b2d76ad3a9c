/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// ```toml
/// [server]
/// host = "localhost"
/// port = 8765
/// secure = false
/// # Dev-container hosting rewrites the port into the hostname:
/// # rewrite = "{host}-{port}.preview.app"
/// retry_ms = 1000
///
/// [vision]
/// radius = 7.5
/// span_deg = 360.0
/// ```

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub server: ServerConfig,
    pub vision: VisionConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Derive the secure scheme (wss) — required when the client itself is
    /// reached over a secure origin.
    pub secure: bool,
    /// Hostname rewrite template for cloud dev-container hosting.
    /// `{host}` and `{port}` are substituted; the proxy owns the real port.
    pub rewrite: Option<String>,
    pub retry_ms: u64,
}

#[derive(Clone, Debug)]
pub struct VisionConfig {
    /// Cutout radius in grid cells.
    pub radius: f32,
    /// Wedge angle in degrees; 360 is a full circle.
    pub span_deg: f32,
}

impl ServerConfig {
    /// The WebSocket endpoint this config describes.
    pub fn endpoint(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        match &self.rewrite {
            Some(template) => {
                let host = template
                    .replace("{host}", &self.host)
                    .replace("{port}", &self.port.to_string());
                format!("{scheme}://{host}")
            }
            None => format!("{scheme}://{}:{}", self.host, self.port),
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_ms)
    }
}

impl VisionConfig {
    pub fn span_radians(&self) -> f32 {
        self.span_deg.to_radians()
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    server: TomlServer,
    #[serde(default)]
    vision: TomlVision,
}

#[derive(Deserialize, Debug)]
struct TomlServer {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    secure: bool,
    #[serde(default)]
    rewrite: Option<String>,
    #[serde(default = "default_retry_ms")]
    retry_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlVision {
    #[serde(default = "default_radius")]
    radius: f32,
    #[serde(default = "default_span_deg")]
    span_deg: f32,
}

// ── Defaults ──

fn default_host() -> String { "localhost".into() }
fn default_port() -> u16 { 8765 }
fn default_retry_ms() -> u64 { 1000 }
fn default_radius() -> f32 { 7.5 }
fn default_span_deg() -> f32 { 360.0 }

impl Default for TomlServer {
    fn default() -> Self {
        TomlServer {
            host: default_host(),
            port: default_port(),
            secure: false,
            rewrite: None,
            retry_ms: default_retry_ms(),
        }
    }
}

impl Default for TomlVision {
    fn default() -> Self {
        TomlVision {
            radius: default_radius(),
            span_deg: default_span_deg(),
        }
    }
}

// ── Loading ──

impl ClientConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let toml_cfg = load_toml(&candidate_dirs());

        ClientConfig {
            server: ServerConfig {
                host: toml_cfg.server.host,
                port: toml_cfg.server.port,
                secure: toml_cfg.server.secure,
                rewrite: toml_cfg.server.rewrite,
                retry_ms: toml_cfg.server.retry_ms,
            },
            vision: VisionConfig {
                radius: toml_cfg.vision.radius,
                span_deg: toml_cfg.vision.span_deg,
            },
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
/// Shared with the theme preference file.
pub fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(host: &str, port: u16, secure: bool, rewrite: Option<&str>) -> ServerConfig {
        ServerConfig {
            host: host.into(),
            port,
            secure,
            rewrite: rewrite.map(String::from),
            retry_ms: 1000,
        }
    }

    #[test]
    fn plain_endpoint() {
        assert_eq!(server("localhost", 8765, false, None).endpoint(), "ws://localhost:8765");
    }

    #[test]
    fn secure_origin_derives_wss() {
        assert_eq!(server("example.com", 8765, true, None).endpoint(), "wss://example.com:8765");
    }

    #[test]
    fn rewrite_substitutes_port_into_hostname() {
        let s = server("mybox", 8765, true, Some("{host}-{port}.preview.app"));
        assert_eq!(s.endpoint(), "wss://mybox-8765.preview.app");
    }

    #[test]
    fn defaults_parse_from_empty_toml() {
        let cfg: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.server.host, "localhost");
        assert_eq!(cfg.server.port, 8765);
        assert_eq!(cfg.server.retry_ms, 1000);
        assert!(!cfg.server.secure);
        assert_eq!(cfg.vision.span_deg, 360.0);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg: TomlConfig = toml::from_str("[server]\nport = 9000\n").unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.host, "localhost");
    }
}
