//! Tray settings, physics tuning and dice style profiles
//!
//! Loaded from JSON; every field falls back to the tuned defaults in
//! [`crate::consts`] when absent.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading, saving or validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Which dice read their value from orientation and which fall back to a uniform draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ResolutionProfile {
    /// d4, d6, d8, d10, d12 and d20 read the upward face; the coin reads its axis
    #[default]
    Geometric,
    /// Only d4, d6 and the coin read orientation; everything else is drawn uniformly
    Simplified,
}

impl ResolutionProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionProfile::Geometric => "Geometric",
            ResolutionProfile::Simplified => "Simplified",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "geometric" | "geo" => Some(ResolutionProfile::Geometric),
            "simplified" | "simple" => Some(ResolutionProfile::Simplified),
            _ => None,
        }
    }
}

/// Surface finish of the dice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextureStyle {
    #[default]
    Solid,
    Crystal,
    Metal,
    Wood,
    Marble,
}

impl TextureStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextureStyle::Solid => "solid",
            TextureStyle::Crystal => "crystal",
            TextureStyle::Metal => "metal",
            TextureStyle::Wood => "wood",
            TextureStyle::Marble => "marble",
        }
    }

    /// Unknown names map to `Solid`, same as an empty texture field in a stored profile
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "crystal" => TextureStyle::Crystal,
            "metal" => TextureStyle::Metal,
            "wood" => TextureStyle::Wood,
            "marble" => TextureStyle::Marble,
            _ => TextureStyle::Solid,
        }
    }
}

/// Appearance stamped onto each die when it spawns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiceStyle {
    pub dice_color: String,
    pub number_color: String,
    pub texture: TextureStyle,
    /// Name of the profile the style came from, if any
    pub profile_label: Option<String>,
}

impl Default for DiceStyle {
    fn default() -> Self {
        Self {
            dice_color: "#e5e7eb".to_string(),
            number_color: "#111827".to_string(),
            texture: TextureStyle::Solid,
            profile_label: None,
        }
    }
}

/// Rigid body integration tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Fixed substep length (seconds)
    pub fixed_dt: f32,
    pub max_substeps: u32,
    /// Frame time is clamped to this before integration (seconds)
    pub max_frame_dt: f32,
    pub gravity: f32,
    pub friction: f32,
    pub restitution: f32,
    pub live_linear_damping: f32,
    pub live_angular_damping: f32,
    pub settled_linear_damping: f32,
    pub settled_angular_damping: f32,
    /// Contact solver passes per substep
    pub solver_iterations: u32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            fixed_dt: SIM_DT,
            max_substeps: MAX_SUBSTEPS,
            max_frame_dt: MAX_FRAME_DT,
            gravity: GRAVITY,
            friction: FRICTION,
            restitution: RESTITUTION,
            live_linear_damping: LIVE_LINEAR_DAMPING,
            live_angular_damping: LIVE_ANGULAR_DAMPING,
            settled_linear_damping: SETTLED_LINEAR_DAMPING,
            settled_angular_damping: SETTLED_ANGULAR_DAMPING,
            solver_iterations: 4,
        }
    }
}

/// Rest detection tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleTuning {
    pub linear_threshold: f32,
    pub angular_threshold: f32,
    pub dwell_ms: f64,
}

impl Default for SettleTuning {
    fn default() -> Self {
        Self {
            linear_threshold: SETTLE_LINEAR_THRESHOLD,
            angular_threshold: SETTLE_ANGULAR_THRESHOLD,
            dwell_ms: SETTLE_DWELL_MS,
        }
    }
}

/// Tray geometry (floor at y = 0, centred on the origin, front edge at +Z)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrayDims {
    pub width: f32,
    pub depth: f32,
    pub wall_height: f32,
    pub wall_thickness: f32,
    pub lip_height: f32,
    pub lip_thickness: f32,
}

impl Default for TrayDims {
    fn default() -> Self {
        Self {
            width: TRAY_WIDTH,
            depth: TRAY_DEPTH,
            wall_height: TRAY_HEIGHT,
            wall_thickness: WALL_THICKNESS,
            lip_height: LIP_HEIGHT,
            lip_thickness: LIP_THICKNESS,
        }
    }
}

impl TrayDims {
    #[inline]
    pub fn half_width(&self) -> f32 {
        self.width / 2.0
    }

    #[inline]
    pub fn half_depth(&self) -> f32 {
        self.depth / 2.0
    }
}

/// Complete session configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub physics: PhysicsTuning,
    pub settle: SettleTuning,
    pub tray: TrayDims,
    pub resolution: ResolutionProfile,
    pub style: DiceStyle,
    /// Fixed RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Settings {
    /// Parse settings from JSON and validate them
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings, falling back to defaults when the file is missing or bad
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::info!("Using default settings ({})", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Reject tunings the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        let p = &self.physics;
        if !(p.fixed_dt > 0.0) {
            return Err(SettingsError::Invalid("physics.fixed_dt must be positive".into()));
        }
        if p.max_substeps == 0 {
            return Err(SettingsError::Invalid("physics.max_substeps must be at least 1".into()));
        }
        if !(p.max_frame_dt > 0.0) {
            return Err(SettingsError::Invalid("physics.max_frame_dt must be positive".into()));
        }
        if self.settle.linear_threshold <= 0.0 || self.settle.angular_threshold <= 0.0 {
            return Err(SettingsError::Invalid("settle thresholds must be positive".into()));
        }
        if self.settle.dwell_ms < 0.0 {
            return Err(SettingsError::Invalid("settle.dwell_ms must not be negative".into()));
        }
        let t = &self.tray;
        if t.width <= 0.0 || t.depth <= 0.0 || t.wall_height <= 0.0 || t.wall_thickness <= 0.0 {
            return Err(SettingsError::Invalid("tray dimensions must be positive".into()));
        }
        Ok(())
    }
}

/// Named dice styles ("bags")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profiles {
    profiles: BTreeMap<String, DiceStyle>,
}

impl Default for Profiles {
    /// Ships with the two player bags
    fn default() -> Self {
        let mut profiles = Self::empty();
        profiles.save(
            "Emp's dice",
            DiceStyle {
                dice_color: "#047857".to_string(),
                number_color: "#020617".to_string(),
                texture: TextureStyle::Crystal,
                profile_label: None,
            },
        );
        profiles.save(
            "Bill's dice",
            DiceStyle {
                dice_color: "#ea580c".to_string(),
                number_color: "#111827".to_string(),
                texture: TextureStyle::Marble,
                profile_label: None,
            },
        );
        profiles
    }
}

impl Profiles {
    pub fn empty() -> Self {
        Self {
            profiles: BTreeMap::new(),
        }
    }

    /// Profile name used by the per-player shortcut buttons
    pub fn player_profile_name(player: &str) -> String {
        format!("{}'s dice", player)
    }

    /// Store (or overwrite) a profile. Blank names are ignored.
    pub fn save(&mut self, name: &str, style: DiceStyle) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        let style = DiceStyle {
            profile_label: None,
            ..style
        };
        self.profiles.insert(name.to_string(), style);
        true
    }

    pub fn get(&self, name: &str) -> Option<&DiceStyle> {
        self.profiles.get(name)
    }

    /// Profile names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Style for a named profile, labelled with that name
    pub fn style_for(&self, name: &str) -> Option<DiceStyle> {
        self.get(name).map(|style| DiceStyle {
            profile_label: Some(name.to_string()),
            ..style.clone()
        })
    }

    /// Make a named profile the active style. Unknown names leave settings untouched.
    pub fn apply(&self, name: &str, settings: &mut Settings) -> bool {
        match self.style_for(name) {
            Some(style) => {
                settings.style = style;
                true
            }
            None => {
                log::warn!("No dice profile named {:?}", name);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_consts() {
        let settings = Settings::default();
        assert_eq!(settings.physics.fixed_dt, SIM_DT);
        assert_eq!(settings.physics.max_substeps, 3);
        assert_eq!(settings.physics.gravity, 30.0);
        assert_eq!(settings.physics.friction, 0.7);
        assert_eq!(settings.physics.restitution, 0.08);
        assert_eq!(settings.settle.dwell_ms, 700.0);
        assert_eq!(settings.resolution, ResolutionProfile::Geometric);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = Settings::from_json(r#"{ "seed": 42, "resolution": "Simplified" }"#).unwrap();
        assert_eq!(settings.seed, Some(42));
        assert_eq!(settings.resolution, ResolutionProfile::Simplified);
        assert_eq!(settings.tray, TrayDims::default());
    }

    #[test]
    fn test_json_roundtrip_preserves_style() {
        let mut settings = Settings::default();
        settings.style.texture = TextureStyle::Wood;
        let json = settings.to_json().unwrap();
        let loaded = Settings::from_json(&json).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let err = Settings::from_json(r#"{ "physics": { "max_substeps": 0 } }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));

        let err = Settings::from_json("not json").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let settings = Settings::load_or_default("/definitely/not/here/dice.json");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_profiles_apply() {
        let profiles = Profiles::default();
        assert_eq!(profiles.names(), vec!["Bill's dice", "Emp's dice"]);

        let mut settings = Settings::default();
        let name = Profiles::player_profile_name("Bill");
        assert!(profiles.apply(&name, &mut settings));
        assert_eq!(settings.style.dice_color, "#ea580c");
        assert_eq!(settings.style.profile_label.as_deref(), Some("Bill's dice"));

        assert!(!profiles.apply("Nobody's dice", &mut settings));
        assert_eq!(settings.style.texture, TextureStyle::Marble);
    }

    #[test]
    fn test_profiles_ignore_blank_names() {
        let mut profiles = Profiles::empty();
        assert!(!profiles.save("   ", DiceStyle::default()));
        assert!(profiles.is_empty());
    }

    #[test]
    fn test_texture_style_parse() {
        assert_eq!(TextureStyle::from_str("Crystal"), TextureStyle::Crystal);
        assert_eq!(TextureStyle::from_str(""), TextureStyle::Solid);
        assert_eq!(ResolutionProfile::from_str("simple"), Some(ResolutionProfile::Simplified));
        assert_eq!(ResolutionProfile::from_str("fancy"), None);
    }
}
