use directories::ProjectDirs;
use doc_model::ViewerSettings;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_SCHEMA_VERSION: u32 = 1;
const SETTINGS_FILE: &str = "viewer-settings.json";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unable to resolve local data directory")]
    NoDataDirectory,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("settings schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("invalid value {value:?} for {variable}")]
    InvalidOverride { variable: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SettingsEnvelope {
    version: u32,
    settings: ViewerSettings,
}

impl Storage {
    pub fn from_default_project() -> Result<Self, StorageError> {
        let dirs = ProjectDirs::from("dev", "Folio", "Folio").ok_or(StorageError::NoDataDirectory)?;

        Ok(Self { root: dirs.data_local_dir().to_path_buf() })
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    /// Loads saved settings, or the defaults when nothing was saved yet.
    pub fn load_settings(&self) -> Result<ViewerSettings, StorageError> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(ViewerSettings::default());
        }

        load_settings_file(&path)
    }

    pub fn save_settings(&self, settings: &ViewerSettings) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;

        let envelope = SettingsEnvelope { version: SETTINGS_SCHEMA_VERSION, settings: settings.clone() };

        let bytes = serde_json::to_vec_pretty(&envelope)?;
        fs::write(self.settings_path(), bytes)?;
        Ok(())
    }
}

/// Reads settings from an explicit file path.
///
/// Accepts the versioned envelope written by [`Storage`] or, when the object
/// carries no `version` key, a bare settings object written by hand.
pub fn load_settings_file(path: &Path) -> Result<ViewerSettings, StorageError> {
    let bytes = fs::read(path)?;
    let value: serde_json::Value = serde_json::from_slice(&bytes)?;

    let Some(version) = value.get("version") else {
        return Ok(serde_json::from_value(value)?);
    };

    if let Some(found) = version.as_u64().filter(|found| *found > u64::from(SETTINGS_SCHEMA_VERSION)) {
        let found = u32::try_from(found).unwrap_or(u32::MAX);
        return Err(StorageError::UnsupportedVersion { found, supported: SETTINGS_SCHEMA_VERSION });
    }

    let envelope: SettingsEnvelope = serde_json::from_value(value)?;
    Ok(envelope.settings)
}

/// Applies `FOLIO_*` environment variables on top of `settings`.
///
/// Environment variables:
/// - `FOLIO_VIEW_MODE`: `document` or `thumbnails`
/// - `FOLIO_PAGE_MODE`: `single`, `double` or `automatic`
/// - `FOLIO_PAGE_SCROLLING`: `horizontal` or `vertical`
/// - `FOLIO_DOUBLE_PAGE_ON_FIRST_PAGE`: `true` or `false`
/// - `FOLIO_PAGE_PADDING`: padding in points
/// - `FOLIO_ZOOM_SMALL_DOCUMENTS`: `true` or `false`
/// - `FOLIO_STATUS_BAR_STYLE`: `inherit`, `smart_black`, `black_opaque`, `default_white`, `disable`
/// - `FOLIO_SCROLL_ON_TAP`: `true` or `false`
/// - `FOLIO_DEVICE_IDIOM`: `phone` or `tablet`
///
/// # Errors
/// Returns an error if any variable contains an invalid value.
pub fn apply_env_overrides(settings: &mut ViewerSettings) -> Result<(), StorageError> {
    apply_overrides(settings, |name| std::env::var(name).ok())
}

/// Same as [`apply_env_overrides`] with an explicit variable lookup.
pub fn apply_overrides(
    settings: &mut ViewerSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), StorageError> {
    if let Some(value) = lookup("FOLIO_VIEW_MODE") {
        settings.view_mode = parse_enum("FOLIO_VIEW_MODE", value)?;
    }
    if let Some(value) = lookup("FOLIO_PAGE_MODE") {
        settings.page_mode = parse_enum("FOLIO_PAGE_MODE", value)?;
    }
    if let Some(value) = lookup("FOLIO_PAGE_SCROLLING") {
        settings.page_scrolling = parse_enum("FOLIO_PAGE_SCROLLING", value)?;
    }
    if let Some(value) = lookup("FOLIO_DOUBLE_PAGE_ON_FIRST_PAGE") {
        settings.double_page_mode_on_first_page = parse_value("FOLIO_DOUBLE_PAGE_ON_FIRST_PAGE", value)?;
    }
    if let Some(value) = lookup("FOLIO_PAGE_PADDING") {
        let padding: f32 = parse_value("FOLIO_PAGE_PADDING", value.clone())?;
        if !padding.is_finite() || padding < 0.0 {
            return Err(StorageError::InvalidOverride { variable: "FOLIO_PAGE_PADDING", value });
        }
        settings.page_padding = padding;
    }
    if let Some(value) = lookup("FOLIO_ZOOM_SMALL_DOCUMENTS") {
        settings.zooming_small_documents_enabled = parse_value("FOLIO_ZOOM_SMALL_DOCUMENTS", value)?;
    }
    if let Some(value) = lookup("FOLIO_STATUS_BAR_STYLE") {
        settings.status_bar_style_setting = parse_enum("FOLIO_STATUS_BAR_STYLE", value)?;
    }
    if let Some(value) = lookup("FOLIO_SCROLL_ON_TAP") {
        settings.scroll_on_tap_page_end_enabled = parse_value("FOLIO_SCROLL_ON_TAP", value)?;
    }
    if let Some(value) = lookup("FOLIO_DEVICE_IDIOM") {
        settings.device_idiom = parse_enum("FOLIO_DEVICE_IDIOM", value)?;
    }

    Ok(())
}

fn parse_enum<T: DeserializeOwned>(variable: &'static str, value: String) -> Result<T, StorageError> {
    let normalized = value.trim().to_ascii_lowercase();
    serde_json::from_value(serde_json::Value::String(normalized))
        .map_err(|_| StorageError::InvalidOverride { variable, value })
}

fn parse_value<T: std::str::FromStr>(variable: &'static str, value: String) -> Result<T, StorageError> {
    value.trim().parse::<T>().map_err(|_| StorageError::InvalidOverride { variable, value })
}
