/// Platform-specific functionality: elevation checks and per-user paths.
#[cfg(windows)]
mod permissions;

#[cfg(windows)]
pub use permissions::is_elevated;

use std::path::PathBuf;

/// Device actions need administrator rights; other platforms never have
/// them.
#[cfg(not(windows))]
pub fn is_elevated() -> bool {
    false
}

/// Where the settings file lives when the caller gives no path.
///
/// `%APPDATA%\DevSleuth\settings.json` on Windows,
/// `$XDG_CONFIG_HOME/devsleuth/settings.json` (or `~/.config/...`)
/// elsewhere, and the working directory as a last resort.
pub fn default_settings_path() -> PathBuf {
    let base = if cfg!(windows) {
        std::env::var_os("APPDATA").map(|dir| PathBuf::from(dir).join("DevSleuth"))
    } else {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
            .map(|dir| dir.join("devsleuth"))
    };
    base.unwrap_or_default().join("settings.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_path_file_name() {
        let path = default_settings_path();
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("settings.json"));
    }
}
