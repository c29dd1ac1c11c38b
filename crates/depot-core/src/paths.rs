use dirs::home_dir;
use std::path::PathBuf;

/// Returns the depot home directory, or None if the user's home cannot be resolved.
pub fn try_depot_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("DEPOT_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".depot"))
}

/// Catalog database path inside `home`: `<home>/catalog.db`
pub fn db_path(home: &std::path::Path) -> PathBuf {
    home.join("catalog.db")
}

/// Managed upload root inside `home`: `<home>/uploads`
pub fn uploads_path(home: &std::path::Path) -> PathBuf {
    home.join("uploads")
}

/// Optional configuration file inside `home`: `<home>/config.toml`
pub fn config_path(home: &std::path::Path) -> PathBuf {
    home.join("config.toml")
}

/// Extract the file name from a path-like string, ignoring any directories.
pub fn file_name_of(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let home = PathBuf::from("/var/lib/depot");
        assert_eq!(db_path(&home), PathBuf::from("/var/lib/depot/catalog.db"));
        assert_eq!(uploads_path(&home), PathBuf::from("/var/lib/depot/uploads"));
        assert_eq!(config_path(&home), PathBuf::from("/var/lib/depot/config.toml"));
    }

    #[test]
    fn test_file_name_of() {
        assert_eq!(file_name_of("C:\\Users\\me\\setup.exe"), "setup.exe");
        assert_eq!(file_name_of("/tmp/app.tar.gz"), "app.tar.gz");
        assert_eq!(file_name_of("plain.zip"), "plain.zip");
    }
}
