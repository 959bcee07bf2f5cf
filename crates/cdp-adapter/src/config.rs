use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf};
use which::which;

/// Desktop user agent presented by every agent browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Configuration for launching one agent's browser.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CdpConfig {
    pub executable: PathBuf,
    /// Profile directory; each agent gets its own.
    pub user_data_dir: PathBuf,
    pub headless: bool,
    pub no_sandbox: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: String,
    pub lang: String,
    pub stealth: bool,
    pub default_deadline_ms: u64,
    pub launch_timeout_ms: u64,
}

impl Default for CdpConfig {
    fn default() -> Self {
        Self {
            executable: detect_chrome_executable().unwrap_or_default(),
            user_data_dir: PathBuf::from("./.sockpuppet-profile"),
            headless: resolve_headless_default(),
            no_sandbox: false,
            window_width: 1920,
            window_height: 1080,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            lang: "en-US".to_string(),
            stealth: true,
            default_deadline_ms: 30_000,
            launch_timeout_ms: 20_000,
        }
    }
}

impl CdpConfig {
    /// Same settings, isolated profile directory.
    pub fn with_profile(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_data_dir = dir.into();
        self
    }

    /// Configured executable if it exists, otherwise whatever detection finds.
    pub fn resolved_executable(&self) -> Option<PathBuf> {
        if !self.executable.as_os_str().is_empty() && self.executable.exists() {
            return Some(self.executable.clone());
        }
        detect_chrome_executable()
    }
}

fn resolve_headless_default() -> bool {
    match env::var("SOCKPUPPET_HEADLESS") {
        Ok(value) => {
            let lower = value.to_ascii_lowercase();
            !matches!(lower.as_str(), "0" | "false" | "no" | "off")
        }
        Err(_) => true,
    }
}

/// Locate a Chrome/Chromium binary: `SOCKPUPPET_CHROME`, then `PATH`, then
/// well-known install locations.
pub fn detect_chrome_executable() -> Option<PathBuf> {
    if let Ok(raw) = env::var("SOCKPUPPET_CHROME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    for name in chrome_executable_names() {
        if let Ok(path) = which(name) {
            return Some(path);
        }
    }

    let skip_defaults = env::var("SOCKPUPPET_SKIP_OS_PATHS")
        .map(|value| !value.trim().is_empty())
        .unwrap_or(false);
    if skip_defaults {
        return None;
    }

    os_specific_chrome_paths()
        .into_iter()
        .find(|candidate| candidate.exists())
}

fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe"]
    }

    #[cfg(not(target_os = "windows"))]
    {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium",
            "chromium-browser",
        ]
    }
}

fn os_specific_chrome_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    }

    #[cfg(target_os = "windows")]
    {
        ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"]
            .iter()
            .filter_map(|key| env::var(key).ok())
            .map(|root| PathBuf::from(root.trim()).join("Google/Chrome/Application/chrome.exe"))
            .collect()
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![
            PathBuf::from("/usr/bin/google-chrome-stable"),
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium-browser"),
            PathBuf::from("/usr/bin/chromium"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn env_override_wins_when_file_exists() {
        let dir = tempdir().unwrap();
        let fake = dir.path().join("my-chrome");
        fs::write(&fake, b"").unwrap();

        env::set_var("SOCKPUPPET_CHROME", &fake);
        let detected = detect_chrome_executable();
        env::remove_var("SOCKPUPPET_CHROME");

        assert_eq!(detected, Some(fake));
    }

    #[test]
    #[serial]
    fn missing_override_falls_through() {
        env::set_var("SOCKPUPPET_CHROME", "/definitely/not/here/chrome");
        env::set_var("SOCKPUPPET_SKIP_OS_PATHS", "1");
        let detected = detect_chrome_executable();
        env::remove_var("SOCKPUPPET_CHROME");
        env::remove_var("SOCKPUPPET_SKIP_OS_PATHS");

        assert_ne!(detected, Some(PathBuf::from("/definitely/not/here/chrome")));
    }

    #[test]
    #[serial]
    fn headless_env_switches_to_headful() {
        env::set_var("SOCKPUPPET_HEADLESS", "off");
        assert!(!resolve_headless_default());
        env::set_var("SOCKPUPPET_HEADLESS", "1");
        assert!(resolve_headless_default());
        env::remove_var("SOCKPUPPET_HEADLESS");
        assert!(resolve_headless_default());
    }

    #[test]
    fn profile_override_keeps_other_settings() {
        let cfg = CdpConfig::default().with_profile("/tmp/agent-a");
        assert_eq!(cfg.user_data_dir, PathBuf::from("/tmp/agent-a"));
        assert_eq!(cfg.window_width, 1920);
        assert_eq!(cfg.lang, "en-US");
    }
}
