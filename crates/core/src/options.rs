//! Generation option constants and validation.
//!
//! Options are validated for shape before a job record is created, then
//! passed through opaquely to the external content and build services.
//! No magic strings — every supported value is a named constant table.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Supported option tables
// ---------------------------------------------------------------------------

/// Theme identifiers the external site builder accepts.
pub const SUPPORTED_THEMES: &[&str] =
    &["ananke", "papermod", "hugo-book", "terminal", "clarity"];

/// Content tone presets understood by the AI content service.
pub const VALID_TONES: &[&str] = &["professional", "friendly", "casual", "bold"];

/// Content length presets.
pub const VALID_LENGTHS: &[&str] = &["concise", "standard", "detailed"];

/// Content model tiers.
pub const VALID_MODELS: &[&str] = &["standard", "premium"];

/// Customization keys whose values must be a strict `#RRGGBB` color.
const COLOR_KEYS: &[&str] = &["primaryColor", "secondaryColor", "accentColor"];

// ---------------------------------------------------------------------------
// Option types
// ---------------------------------------------------------------------------

/// AI content generation knobs. All fields optional; absent fields fall
/// back to service defaults and are not validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentOptions {
    pub tone: Option<String>,
    pub length: Option<String>,
    pub model: Option<String>,
}

/// Caller-supplied configuration for one generation request.
///
/// `customizations` is an opaque blob forwarded to the builder; the core
/// only shape-checks the color keys inside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub theme: Option<String>,
    #[serde(default)]
    pub auto_detect_theme: bool,
    #[serde(default = "empty_object")]
    pub customizations: serde_json::Value,
    #[serde(default)]
    pub content: ContentOptions,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            theme: None,
            auto_detect_theme: false,
            customizations: empty_object(),
            content: ContentOptions::default(),
        }
    }
}

impl GenerationOptions {
    /// Validate every option field. Called synchronously before any job
    /// record is created; a failure here means no job exists afterwards.
    pub fn validate(&self) -> Result<(), CoreError> {
        match (&self.theme, self.auto_detect_theme) {
            (None, false) => {
                return Err(CoreError::Validation(
                    "A theme is required unless auto_detect_theme is set".to_string(),
                ));
            }
            (Some(theme), _) => validate_theme(theme)?,
            (None, true) => {}
        }

        if let Some(tone) = self.content.tone.as_deref() {
            validate_choice("tone", tone, VALID_TONES)?;
        }
        if let Some(length) = self.content.length.as_deref() {
            validate_choice("length", length, VALID_LENGTHS)?;
        }
        if let Some(model) = self.content.model.as_deref() {
            validate_choice("model", model, VALID_MODELS)?;
        }

        validate_colors(&self.customizations)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Validate that a theme identifier is one of the supported constants.
pub fn validate_theme(theme: &str) -> Result<(), CoreError> {
    if SUPPORTED_THEMES.contains(&theme) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unsupported theme '{theme}'. Must be one of: {}",
            SUPPORTED_THEMES.join(", ")
        )))
    }
}

fn validate_choice(field: &str, value: &str, allowed: &[&str]) -> Result<(), CoreError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid {field} '{value}'. Must be one of: {}",
            allowed.join(", ")
        )))
    }
}

/// Strict `#RRGGBB` check: leading hash plus exactly six hex digits.
pub fn is_valid_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Check every known color key present in the customizations blob, at the
/// top level and one level down (section objects like `"header"`).
fn validate_colors(customizations: &serde_json::Value) -> Result<(), CoreError> {
    let Some(map) = customizations.as_object() else {
        return Ok(());
    };
    for (key, value) in map {
        if let Some(s) = value.as_str() {
            if is_color_key(key) && !is_valid_hex_color(s) {
                return Err(invalid_color(key, s));
            }
        } else if let Some(section) = value.as_object() {
            for (inner_key, inner) in section {
                if let Some(s) = inner.as_str() {
                    if is_color_key(inner_key) && !is_valid_hex_color(s) {
                        return Err(invalid_color(inner_key, s));
                    }
                }
            }
        }
    }
    Ok(())
}

fn is_color_key(key: &str) -> bool {
    COLOR_KEYS.contains(&key) || key.ends_with("_color")
}

fn invalid_color(key: &str, value: &str) -> CoreError {
    CoreError::Validation(format!(
        "Invalid color '{value}' for '{key}'. Expected #RRGGBB"
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
