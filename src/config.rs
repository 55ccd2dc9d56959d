use config::{Config, ConfigError, File as ConfigFile};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Filename WSL uses for the backing store of a distro's root filesystem.
pub const DEFAULT_IMAGE_FILE_NAME: &str = "ext4.vhdx";

/// Seconds to wait after `wsl --shutdown` returns before touching the images.
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 3;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directories searched recursively for disk images. Roots that do not
    /// exist on this machine are skipped during discovery.
    pub root_paths: Vec<String>,
    pub image_file_name: String,
    pub shutdown_grace_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root_paths: default_root_paths(),
            image_file_name: DEFAULT_IMAGE_FILE_NAME.to_string(),
            shutdown_grace_secs: DEFAULT_SHUTDOWN_GRACE_SECS,
        }
    }
}

impl AppConfig {
    pub fn search_roots(&self) -> Vec<PathBuf> {
        self.root_paths.iter().map(PathBuf::from).collect()
    }
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

/// Per-distro images live under the per-application local data root
/// (`Packages\<distro>\LocalState\ext4.vhdx`); Docker Desktop keeps its WSL
/// data disk under its own local data directory.
fn default_root_paths() -> Vec<String> {
    let Ok(local_app_data) = env::var("LOCALAPPDATA") else {
        return Vec::new();
    };
    let base = PathBuf::from(local_app_data);
    vec![
        base.join("Packages").to_string_lossy().into_owned(),
        base.join("Docker")
            .join("wsl")
            .to_string_lossy()
            .into_owned(),
    ]
}
