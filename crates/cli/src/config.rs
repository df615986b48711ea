use cloudacct_account::ResourceTypeRegistry;
use directories::ProjectDirs;
use std::path::PathBuf;

pub const CONFIG_DIR_ENV: &str = "CLOUDACCT_CONFIG_DIR";

/// Resource providers the command categories of this tool depend on.
pub const KNOWN_RESOURCE_TYPES: &[&str] = &["website", "mobileservice", "servicebus"];

/// Explicit directory if given, otherwise the platform default.
pub fn resolve_config_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(get_default_config_dir)
}

pub fn known_resource_types() -> ResourceTypeRegistry {
    KNOWN_RESOURCE_TYPES.iter().copied().collect()
}

/// Get the default configuration directory
fn get_default_config_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "cloudacct", "cloudacct") {
        proj_dirs.config_dir().to_path_buf()
    } else {
        // No home directory; keep state next to the working directory
        PathBuf::from(".cloudacct")
    }
}
