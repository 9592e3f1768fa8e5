use std::path::PathBuf;

/// Return the application configuration directory
pub fn config_dir() -> PathBuf {
    let dir = if let Some(config_dir) = dirs::config_dir() {
        config_dir
    } else {
        // Fallback to home directory if config dir is not available
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
    };
    dir.join(env!("GATEWAY_PKG_NAME"))
}

/// Default location of the virtual device definitions
pub fn vdev_config_path() -> PathBuf {
    config_dir().join("vdev.json")
}
