//! TOML-based configuration for the Touchlink client.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\Touchlink\config.toml`
//! - Linux:    `~/.config/touchlink/config.toml`
//! - macOS:    `~/Library/Application Support/Touchlink/config.toml`
//!
//! Every field carries a serde default so a partial file – or no file at
//! all on first run – produces a working configuration. The defaults are
//! the tuning the gesture engine ships with; each value is independently
//! overridable without code changes.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::gamepad::GamepadTuning;
use crate::application::session::SessionSettings;
use crate::application::touchpad::TouchpadTuning;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub client: ClientConfig,
    pub tuning: TuningConfig,
    pub stick: StickConfig,
}

/// General client behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Key held by the gamepad look-lock toggle.
    #[serde(default = "default_look_lock_key")]
    pub look_lock_key: String,
    /// Key held by the gamepad wheel-select toggle.
    #[serde(default = "default_wheel_select_key")]
    pub wheel_select_key: String,
    /// Caps-lock-style key that toggles instead of emitting an up half.
    #[serde(default = "default_sticky_key")]
    pub sticky_key: String,
}

/// Gesture thresholds and sensitivities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TuningConfig {
    /// Multiplier from surface deltas to remote pointer deltas.
    #[serde(default = "default_pointer_sensitivity")]
    pub pointer_sensitivity: f64,
    /// Camera-look sensitivity; 30 passes raw deltas through unscaled.
    #[serde(default = "default_camera_sensitivity")]
    pub camera_sensitivity: f64,
    /// Multiplier from pinch-distance deltas to zoom scroll units.
    #[serde(default = "default_pinch_sensitivity")]
    pub pinch_sensitivity: f64,
    /// Multiplier from two-finger pan deltas to scroll units.
    #[serde(default = "default_scroll_sensitivity")]
    pub scroll_sensitivity: f64,
    /// Double-tap time window in milliseconds.
    #[serde(default = "default_double_tap_window_ms")]
    pub double_tap_window_ms: u64,
    /// Double-tap per-axis distance window in surface pixels.
    #[serde(default = "default_double_tap_distance_px")]
    pub double_tap_distance_px: f64,
    /// Deferred-click confirmation delay in milliseconds.
    #[serde(default = "default_click_confirm_delay_ms")]
    pub click_confirm_delay_ms: u64,
    /// Delay between the halves of a synthesized tap, in milliseconds.
    #[serde(default = "default_click_hold_ms")]
    pub click_hold_ms: u64,
    /// Long-press threshold in milliseconds.
    #[serde(default = "default_long_press_ms")]
    pub long_press_ms: u64,
    /// Two-finger tap duration limit in milliseconds.
    #[serde(default = "default_two_finger_tap_ms")]
    pub two_finger_tap_ms: u64,
    /// Gamepad tap duration limit in milliseconds.
    #[serde(default = "default_gamepad_tap_ms")]
    pub gamepad_tap_ms: u64,
    /// Touchpad per-axis movement threshold in surface pixels.
    #[serde(default = "default_move_threshold_px")]
    pub move_threshold_px: f64,
    /// Gamepad swipe movement threshold in surface pixels.
    #[serde(default = "default_swipe_move_threshold_px")]
    pub swipe_move_threshold_px: f64,
    /// Deltas below this on both axes are not sent.
    #[serde(default = "default_min_move_output")]
    pub min_move_output: f64,
    /// Reconciliation drift threshold in remote pixels.
    #[serde(default = "default_drift_threshold_px")]
    pub drift_threshold_px: f64,
    /// Minimum interval between outbound continuous samples, in milliseconds.
    #[serde(default = "default_min_send_interval_ms")]
    pub min_send_interval_ms: u64,
    /// Per-sample clamp for the pinch zoom axis.
    #[serde(default = "default_zoom_step_limit")]
    pub zoom_step_limit: i32,
    /// Cadence of the server position poll, in milliseconds.
    #[serde(default = "default_position_poll_interval_ms")]
    pub position_poll_interval_ms: u64,
}

/// Virtual stick geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StickConfig {
    /// Deadzone fraction of full deflection.
    #[serde(default = "default_stick_deadzone")]
    pub deadzone: f64,
    /// Surface-space displacement mapping to full deflection.
    #[serde(default = "default_stick_max_radius")]
    pub max_radius_px: f64,
    /// Remote pixels per sample at full deflection for the pointer stick echo.
    #[serde(default = "default_pointer_stick_gain")]
    pub pointer_gain: f64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_look_lock_key() -> String {
    "Alt".to_string()
}
fn default_wheel_select_key() -> String {
    "Tab".to_string()
}
fn default_sticky_key() -> String {
    "CapsLock".to_string()
}
fn default_pointer_sensitivity() -> f64 {
    1.5
}
fn default_camera_sensitivity() -> f64 {
    30.0
}
fn default_pinch_sensitivity() -> f64 {
    0.25
}
fn default_scroll_sensitivity() -> f64 {
    3.0
}
fn default_double_tap_window_ms() -> u64 {
    800
}
fn default_double_tap_distance_px() -> f64 {
    100.0
}
fn default_click_confirm_delay_ms() -> u64 {
    200
}
fn default_click_hold_ms() -> u64 {
    50
}
fn default_long_press_ms() -> u64 {
    300
}
fn default_two_finger_tap_ms() -> u64 {
    300
}
fn default_gamepad_tap_ms() -> u64 {
    350
}
fn default_move_threshold_px() -> f64 {
    3.0
}
fn default_swipe_move_threshold_px() -> f64 {
    6.0
}
fn default_min_move_output() -> f64 {
    0.2
}
fn default_drift_threshold_px() -> f64 {
    100.0
}
fn default_min_send_interval_ms() -> u64 {
    8
}
fn default_zoom_step_limit() -> i32 {
    80
}
fn default_position_poll_interval_ms() -> u64 {
    50
}
fn default_stick_deadzone() -> f64 {
    0.2
}
fn default_stick_max_radius() -> f64 {
    90.0
}
fn default_pointer_stick_gain() -> f64 {
    12.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            tuning: TuningConfig::default(),
            stick: StickConfig::default(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            look_lock_key: default_look_lock_key(),
            wheel_select_key: default_wheel_select_key(),
            sticky_key: default_sticky_key(),
        }
    }
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            pointer_sensitivity: default_pointer_sensitivity(),
            camera_sensitivity: default_camera_sensitivity(),
            pinch_sensitivity: default_pinch_sensitivity(),
            scroll_sensitivity: default_scroll_sensitivity(),
            double_tap_window_ms: default_double_tap_window_ms(),
            double_tap_distance_px: default_double_tap_distance_px(),
            click_confirm_delay_ms: default_click_confirm_delay_ms(),
            click_hold_ms: default_click_hold_ms(),
            long_press_ms: default_long_press_ms(),
            two_finger_tap_ms: default_two_finger_tap_ms(),
            gamepad_tap_ms: default_gamepad_tap_ms(),
            move_threshold_px: default_move_threshold_px(),
            swipe_move_threshold_px: default_swipe_move_threshold_px(),
            min_move_output: default_min_move_output(),
            drift_threshold_px: default_drift_threshold_px(),
            min_send_interval_ms: default_min_send_interval_ms(),
            zoom_step_limit: default_zoom_step_limit(),
            position_poll_interval_ms: default_position_poll_interval_ms(),
        }
    }
}

impl Default for StickConfig {
    fn default() -> Self {
        Self {
            deadzone: default_stick_deadzone(),
            max_radius_px: default_stick_max_radius(),
            pointer_gain: default_pointer_stick_gain(),
        }
    }
}

// ── Conversion into runtime settings ──────────────────────────────────────────

impl AppConfig {
    /// Assembles the runtime settings the session consumes.
    pub fn session_settings(&self) -> SessionSettings {
        let t = &self.tuning;
        SessionSettings {
            touchpad: TouchpadTuning {
                pointer_sensitivity: t.pointer_sensitivity,
                scroll_sensitivity: t.scroll_sensitivity,
                double_tap_window: Duration::from_millis(t.double_tap_window_ms),
                double_tap_distance: t.double_tap_distance_px,
                click_confirm_delay: Duration::from_millis(t.click_confirm_delay_ms),
                click_hold: Duration::from_millis(t.click_hold_ms),
                long_press: Duration::from_millis(t.long_press_ms),
                two_finger_tap: Duration::from_millis(t.two_finger_tap_ms),
                move_threshold: t.move_threshold_px,
            },
            gamepad: GamepadTuning {
                pointer_sensitivity: t.pointer_sensitivity,
                camera_sensitivity: t.camera_sensitivity,
                pinch_sensitivity: t.pinch_sensitivity,
                click_hold: Duration::from_millis(t.click_hold_ms),
                tap_window: Duration::from_millis(t.gamepad_tap_ms),
                move_threshold: t.swipe_move_threshold_px,
                min_move_output: t.min_move_output,
                min_send_interval: Duration::from_millis(t.min_send_interval_ms),
                zoom_step_limit: t.zoom_step_limit,
                look_lock_key: self.client.look_lock_key.clone(),
                wheel_select_key: self.client.wheel_select_key.clone(),
            },
            stick_max_radius: self.stick.max_radius_px,
            stick_deadzone: self.stick.deadzone,
            pointer_stick_gain: self.stick.pointer_gain,
            drift_threshold: t.drift_threshold_px,
            sticky_key: self.client.sticky_key.clone(),
        }
    }

    /// Cadence of the server position poll.
    pub fn position_poll_interval(&self) -> Duration {
        Duration::from_millis(self.tuning.position_poll_interval_ms)
    }

    /// Cadence for the deferred-work tick; half the minimum send interval so
    /// deadlines are observed promptly.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tuning.min_send_interval_ms.max(2) / 2)
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from disk, returning `AppConfig::default()` if the file
/// does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = config_file_path()?;

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Persists `config` to disk, creating the config directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    let path = config_file_path()?;

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config base directory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Touchlink"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("touchlink"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Touchlink")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_shipped_tuning() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert – spot-check the values the gesture engine was tuned with
        assert_eq!(cfg.tuning.pointer_sensitivity, 1.5);
        assert_eq!(cfg.tuning.double_tap_window_ms, 800);
        assert_eq!(cfg.tuning.click_confirm_delay_ms, 200);
        assert_eq!(cfg.tuning.zoom_step_limit, 80);
        assert_eq!(cfg.stick.deadzone, 0.2);
        assert_eq!(cfg.client.look_lock_key, "Alt");
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        // Arrange
        let mut cfg = AppConfig::default();
        cfg.tuning.camera_sensitivity = 45.0;
        cfg.stick.max_radius_px = 120.0;

        // Act
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: AppConfig = toml::from_str(&toml_str).expect("deserialize");

        // Assert
        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let toml_str = r#"
[client]
[tuning]
[stick]
"#;

        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize minimal");

        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_tuning_overrides_only_named_fields() {
        let toml_str = r#"
[client]
[tuning]
pinch_sensitivity = 0.5
min_send_interval_ms = 4
[stick]
"#;

        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        assert_eq!(cfg.tuning.pinch_sensitivity, 0.5);
        assert_eq!(cfg.tuning.min_send_interval_ms, 4);
        // Unnamed fields keep their defaults.
        assert_eq!(cfg.tuning.camera_sensitivity, 30.0);
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        let result: Result<AppConfig, toml::de::Error> = toml::from_str("[[[ nope");
        assert!(result.is_err());
    }

    #[test]
    fn test_session_settings_carry_durations_and_keys() {
        // Arrange
        let mut cfg = AppConfig::default();
        cfg.tuning.click_confirm_delay_ms = 150;
        cfg.client.look_lock_key = "Shift".to_string();

        // Act
        let settings = cfg.session_settings();

        // Assert
        assert_eq!(settings.touchpad.click_confirm_delay, Duration::from_millis(150));
        assert_eq!(settings.gamepad.look_lock_key, "Shift");
        assert_eq!(settings.drift_threshold, 100.0);
    }

    #[test]
    fn test_tick_interval_is_half_the_send_interval() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.tick_interval(), Duration::from_millis(4));
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("config.toml"));
        }
        // NoPlatformConfigDir in a stripped CI environment is acceptable.
    }
}
