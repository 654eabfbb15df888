//! Configuration loading, resolution, and persistence.
//!
//! Handles the TOML config file (~/.config/garland/config.toml): `[tuning]`,
//! `[world]` and type-prefixed actor sections `[session.<id>]`,
//! `[mock_player.<id>]`, `[webserver.<id>]`.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub use garland::GarlandConfig;

/// Build a global ID from a type prefix and index: `"session.0"`,
/// `"webserver.0"`, etc.
pub fn global_id(prefix: &str, index: &str) -> String {
    format!("{prefix}.{index}")
}

/// Generate a short unique ID (8 hex chars from system time).
/// Used for WebSocket source IDs (`ws.{hex}`).
pub fn generate_id() -> String {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{:08x}", (ts ^ (seq as u64)) as u32)
}

// ---------------------------------------------------------------------------
// Persistence I/O
// ---------------------------------------------------------------------------

/// Returns `~/.config/garland/config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("garland")
        .join("config.toml")
}

/// Load persisted config from disk. A missing file is created with
/// defaults; an unreadable or invalid one falls back to defaults without
/// touching the file.
pub fn load(path: &Path) -> GarlandConfig {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<GarlandConfig>(&contents) {
            Ok(config) => {
                tracing::info!("loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("failed to parse {}: {e}", path.display());
                GarlandConfig::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let defaults = GarlandConfig::default();
            tracing::info!("no config file found, creating {}", path.display());
            save_to(path, &defaults);
            defaults
        }
        Err(e) => {
            tracing::warn!("failed to read {}: {e}", path.display());
            GarlandConfig::default()
        }
    }
}

/// Write config to a specific path. Creates parent dirs if needed. Never panics.
pub fn save_to(path: &Path, config: &GarlandConfig) {
    if let Some(dir) = path.parent()
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        tracing::warn!("failed to create config dir {}: {e}", dir.display());
        return;
    }
    match toml::to_string_pretty(config) {
        Ok(contents) => {
            if let Err(e) = std::fs::write(path, contents) {
                tracing::warn!("failed to write {}: {e}", path.display());
            }
        }
        Err(e) => {
            tracing::warn!("failed to serialize config: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Cached config
// ---------------------------------------------------------------------------

/// Cached configuration backed by a TOML file.
///
/// Loaded once at startup. Reads clone under a read guard.
pub struct SystemConfig {
    path: PathBuf,
    inner: RwLock<GarlandConfig>,
}

impl SystemConfig {
    /// Load config from disk (or create defaults) and cache it.
    pub fn new(path: PathBuf) -> Self {
        let config = load(&path);
        Self {
            path,
            inner: RwLock::new(config),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clone the current cached config.
    pub fn snapshot(&self) -> GarlandConfig {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
