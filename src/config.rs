use serde::{Deserialize, Serialize};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// Location of the user overlay, relative to `$HOME`.
const OVERLAY_PATH: &str = ".config/minishell/config.toml";

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub launcher: LauncherConfig,
    #[serde(default)]
    pub redirection: RedirectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub exit_keyword: String,
    /// Input buffer size in bytes including the terminator; 0 means unlimited.
    #[serde(default)]
    pub max_line_length: usize,
    /// Maximum words per line; 0 means unlimited.
    #[serde(default)]
    pub max_args: usize,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct LauncherConfig {
    /// Directories searched, in order, for a program name.
    #[serde(default)]
    pub search_dirs: Vec<String>,
}

/// How an existing redirection target is opened.
#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RedirectMode {
    #[default]
    Append,
    Truncate,
    /// Write from offset 0 without truncating, leaving any longer tail.
    InPlace,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RedirectionConfig {
    #[serde(default)]
    pub mode: RedirectMode,
    #[serde(default = "default_permissions")]
    pub permissions: u32,
}

impl Default for RedirectionConfig {
    fn default() -> Self {
        Self {
            mode: RedirectMode::default(),
            permissions: default_permissions(),
        }
    }
}

fn default_permissions() -> u32 {
    0o666
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub level: String,
    /// Log file path; a leading `~` is expanded.
    #[serde(default)]
    pub file: String,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    launcher: LauncherOverlay,
    #[serde(default)]
    redirection: RedirectionOverlay,
    #[serde(default)]
    logging: LoggingOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    prompt: Option<String>,
    exit_keyword: Option<String>,
    max_line_length: Option<usize>,
    max_args: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct LauncherOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    search_dirs: Vec<String>,
    #[serde(default)]
    remove_search_dirs: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RedirectionOverlay {
    mode: Option<RedirectMode>,
    permissions: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct LoggingOverlay {
    enabled: Option<bool>,
    level: Option<String>,
    file: Option<String>,
}

// ── Merge logic ──

/// Merge a user list into a default list.
/// In replace mode: user list replaces default entirely.
/// In merge mode: remove items first, then extend with additions (deduped).
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge user overlay from ~/.config/minishell/config.toml (if exists)
    pub fn load() -> Self {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_overlay() {
            config.apply_overlay(overlay);
        }
        config
    }

    /// Try to load the user overlay. A file that fails to parse is reported and ignored.
    fn load_overlay() -> Option<ConfigOverlay> {
        let home = std::env::var_os("HOME")?;
        let path = std::path::Path::new(&home).join(OVERLAY_PATH);
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                eprintln!("minishell: config parse error: {e}");
                None
            }
        }
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        let s = overlay.settings;
        override_with(&mut self.settings.prompt, s.prompt);
        override_with(&mut self.settings.exit_keyword, s.exit_keyword);
        override_with(&mut self.settings.max_line_length, s.max_line_length);
        override_with(&mut self.settings.max_args, s.max_args);

        let l = overlay.launcher;
        merge_list(
            &mut self.launcher.search_dirs,
            l.search_dirs,
            &l.remove_search_dirs,
            l.replace,
        );

        let r = overlay.redirection;
        override_with(&mut self.redirection.mode, r.mode);
        override_with(&mut self.redirection.permissions, r.permissions);

        let g = overlay.logging;
        override_with(&mut self.logging.enabled, g.enabled);
        override_with(&mut self.logging.level, g.level);
        override_with(&mut self.logging.file, g.file);
    }

    /// Serialize the merged configuration, as printed by `--dump-config`.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}
