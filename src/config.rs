//! Configuration options

use crate::types::Modifiers;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use format_serde_error::SerdeError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Write,
    path::Path,
};

/// Configuration file name
const CONFIG_FILE: &str = "stacktile.yml";

/// Project directories relevant to [`stacktile`](crate)
static PROJECT_DIRS: Lazy<ProjectDirs> = Lazy::new(|| {
    ProjectDirs::from("org", "stacktile", "stacktile")
        .expect("could not detect user home directory to place program files")
});

// =============== SatModifier ==================== [[[

/// Keyboard modifier that arms the stack-and-tile gestures while held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SatModifier {
    /// Either shift key
    Shift,
    /// Either control key
    #[serde(alias = "ctrl")]
    Control,
    /// Either option key
    Option,
    /// Either command key
    Command,
    /// The menu key
    Menu,
}

impl SatModifier {
    /// The bit this modifier occupies in an event's modifier mask
    pub const fn mask(self) -> Modifiers {
        match self {
            Self::Shift => Modifiers::SHIFT,
            Self::Control => Modifiers::CONTROL,
            Self::Option => Modifiers::OPTION,
            Self::Command => Modifiers::COMMAND,
            Self::Menu => Modifiers::MENU,
        }
    }
} // ]]] === SatModifier ===

// =============== GlobalSettings ================= [[[

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    /// Modifier key held to snap windows together
    pub modifier: SatModifier,

    /// Distance in pixels within which a dragged edge matches a tab
    #[serde(alias = "snap-distance")]
    pub snap_distance: f32,

    /// Minimum overlap with the screen before a group counts as visible
    #[serde(alias = "min-overlap")]
    pub min_overlap: f32,

    /// Margin used when pulling an off-screen group back over an edge
    #[serde(alias = "move-to-screen")]
    pub move_to_screen: f32,

    /// Widest a single tab may get in a shared tab bar
    #[serde(alias = "max-tab-width")]
    pub max_tab_width: f32,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            modifier:       SatModifier::Option,
            snap_distance:  12.,
            min_overlap:    50.,
            move_to_screen: 75.,
            max_tab_width:  135.,
        }
    }
} // ]]] === Global Settings ===

// =================== Config ===================== [[[

/// Configuration file to parse
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Global settings
    #[serde(flatten)]
    pub global: GlobalSettings,
}

impl Config {
    /// Create the default configuration file, then load it
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            log::debug!("creating configuration path: {}", path.display());
            fs::create_dir_all(path).context("unable to create configuration directory")?;
        }

        let path = path.join(CONFIG_FILE);
        log::debug!("configuration path: {}", path.display());

        if !path.is_file() {
            let initialization =
                serde_yaml::to_string(&Self::default()).context("unable to render defaults")?;

            let mut config_file = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .open(&path)
                .with_context(|| {
                    format!("could not create stacktile config: '{}'", path.display())
                })?;

            config_file
                .write_all(initialization.as_bytes())
                .with_context(|| {
                    format!("could not create stacktile config: '{}'", path.display())
                })?;
            config_file.flush()?;
        }

        Self::load(path)
    }

    /// Load the configuration file from a given path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = fs::read_to_string(&path).context("failed to read config file")?;
        let res = serde_yaml::from_str(&file).map_err(|e| SerdeError::new(file, e))?;

        Ok(res)
    }

    /// Load the default configuration file
    pub fn load_default() -> Result<Self> {
        let path = PROJECT_DIRS.config_dir();
        log::debug!("loading default config: {}", path.display());
        Self::create_default(path)
    }

    /// Load the default configuration file, falling back to built-in
    /// defaults when it cannot be read; a window-server add-on must not
    /// take the server down over a malformed file
    pub fn load_or_default() -> Self {
        match Self::load_default() {
            Ok(config) => config,
            Err(error) => {
                log::error!("failed to load configuration, using defaults: {:?}", error);
                Self::default()
            }
        }
    }
} // ]]] === Config ===
