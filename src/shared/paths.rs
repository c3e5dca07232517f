use std::path::PathBuf;

/// Get the base storage directory following XDG Base Directory Specification.
/// Returns `$XDG_DATA_HOME/screencam` or `~/.local/share/screencam`.
pub fn get_storage_dir() -> PathBuf {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg_data).join("screencam");
    }

    let home = std::env::var("HOME").expect("HOME environment variable must be set");
    PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("screencam")
}

/// Get the logs directory path.
/// Returns `{storage_dir}/logs`.
pub fn get_log_dir() -> PathBuf {
    get_storage_dir().join("logs")
}

/// Default directory for finished recordings when the user has not picked one.
/// Prefers the system videos directory, falling back to the storage dir.
pub fn default_save_dir() -> PathBuf {
    match dirs::video_dir() {
        Some(videos) => videos.join("ScreenCam"),
        None => get_storage_dir().join("recordings"),
    }
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &PathBuf) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_dir_structure() {
        let storage = get_storage_dir();
        assert!(storage.ends_with("screencam"));

        let logs = get_log_dir();
        assert!(logs.ends_with("logs"));
    }

    #[test]
    fn test_default_save_dir_is_named() {
        let dir = default_save_dir();
        assert!(dir.ends_with("ScreenCam") || dir.ends_with("recordings"));
    }
}
