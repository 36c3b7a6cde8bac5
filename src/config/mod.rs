use crate::core::error::LchatError;
use crate::utils::text::Theme;
use serde_yml::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_IMAGE_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/cyberagent/openverse-style";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

const DEFAULT_PREFERENCES: &[(&str, &str)] = &[
    ("api_key", ""),
    ("model", "openai/gpt-4o-mini"),
    ("temperature", "0.7"),
    ("system_prompt", "You are a helpful assistant."),
    ("line_wrap", "80"),
    ("enable_wrapping", "true"),
    ("theme", "light"),
    ("log_directory", "~/.lchat/logs"),
    ("log_cleanup_days", "7"),
    ("logging_level", "INFO"),
    ("custom_presets", "{}"),
    ("dalle_api_key", ""),
    ("keyword", "gpt"),
    ("model_search_keyword", "models"),
    ("preset_keyword", "presets"),
];

/// Flat key-value preferences as a launcher host would hand them over.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Preferences {
    values: BTreeMap<String, String>,
}

impl Preferences {
    pub fn from_pairs<K: Into<String>, V: Into<String>>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn defaults() -> Self {
        Self::from_pairs(DEFAULT_PREFERENCES.iter().copied())
    }

    /// Parse a flat YAML mapping. Scalars of any type are kept as strings.
    pub fn from_yaml(contents: &str) -> Result<Self, LchatError> {
        let doc: Value = serde_yml::from_str(contents)?;
        let mapping = match doc {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(mapping) => mapping,
            _ => {
                return Err(LchatError::Config(
                    "Preferences file must be a mapping".to_string(),
                ));
            }
        };

        let mut values = BTreeMap::new();
        for (key, value) in mapping {
            let Some(key) = key.as_str() else {
                continue;
            };
            let text = match value {
                Value::Null => String::new(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::String(s) => s,
                other => serde_yml::to_string(&other)?.trim_end().to_string(),
            };
            values.insert(key.to_string(), text);
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    /// Apply a `key=value` override.
    pub fn apply_override(&mut self, assignment: &str) -> Result<(), LchatError> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            LchatError::Input(format!("Expected key=value, got '{}'", assignment))
        })?;
        self.set(key.trim(), value);
        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lchat")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Load preferences from `path`, or from the default location.
    ///
    /// A missing default file yields the built-in defaults. Unreadable files
    /// are `Io` errors; unparsable ones are `Config` errors.
    pub fn load(path: Option<&Path>) -> Result<Self, LchatError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = Self::config_path();
                if !path.exists() {
                    return Ok(Self::defaults());
                }
                path
            }
        };

        let contents = fs::read_to_string(&path)?;
        Self::from_yaml(&contents)
            .map_err(|e| LchatError::Config(format!("Parse {}: {}", path.display(), e)))
    }

    /// [`Preferences::load`] followed by `key=value` overrides.
    ///
    /// Only a file that cannot be read is fatal (outer error). Bad contents
    /// or a malformed override come back as the inner error so every query
    /// can report them.
    pub fn load_with_overrides(
        path: Option<&Path>,
        overrides: &[String],
    ) -> Result<Result<Self, LchatError>, LchatError> {
        let mut prefs = match Self::load(path) {
            Ok(prefs) => prefs,
            Err(e @ LchatError::Io { .. }) => return Err(e),
            Err(e) => return Ok(Err(e)),
        };
        for assignment in overrides {
            if let Err(e) = prefs.apply_override(assignment) {
                return Ok(Err(e));
            }
        }
        Ok(Ok(prefs))
    }

    /// Write the defaults to `path` unless a file is already there.
    pub fn seed_default_file(path: &Path) -> Result<bool, LchatError> {
        if path.exists() {
            return Ok(false);
        }
        Self::defaults().save(path)?;
        Ok(true)
    }

    pub fn save(&self, path: &Path) -> Result<(), LchatError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let yaml_content = serde_yml::to_string(&self.values)?;
        fs::write(path, yaml_content)?;
        Ok(())
    }
}

/// Keywords the host uses to route events to lchat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords {
    pub chat: String,
    pub models: String,
    pub presets: String,
}

impl Default for Keywords {
    fn default() -> Self {
        Self {
            chat: "gpt".to_string(),
            models: "models".to_string(),
            presets: "presets".to_string(),
        }
    }
}

/// Validated, typed view of [`Preferences`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub image_api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub system_prompt: String,
    pub line_wrap: i64,
    pub enable_wrapping: bool,
    pub theme: Theme,
    pub log_directory: PathBuf,
    pub log_cleanup_days: i64,
    pub custom_presets: String,
    pub api_base_url: String,
    pub image_endpoint: String,
    pub keywords: Keywords,
    pub request_timeout: Duration,
}

impl Settings {
    pub fn from_preferences(prefs: &Preferences) -> Result<Self, LchatError> {
        let api_key = prefs
            .get("api_key")
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()))
            .ok_or_else(|| {
                LchatError::Config(format!(
                    "'api_key' must be set in preferences or {}",
                    API_KEY_ENV
                ))
            })?;

        let model = required(prefs, "model")?.trim().to_string();
        if model.is_empty() {
            return Err(LchatError::Config("'model' cannot be empty".to_string()));
        }

        let temperature_raw = required(prefs, "temperature")?;
        let temperature: f32 = temperature_raw.trim().parse().map_err(|_| {
            LchatError::Config(format!("Invalid temperature '{}'", temperature_raw))
        })?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(LchatError::Config(format!(
                "Temperature {} is outside 0.0..=2.0",
                temperature
            )));
        }

        let system_prompt = required(prefs, "system_prompt")?.to_string();

        let line_wrap = prefs
            .get("line_wrap")
            .map(str::trim)
            .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let enable_wrapping = prefs
            .get("enable_wrapping")
            .map(|s| s.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(true);

        let log_cleanup_days = match prefs.get("log_cleanup_days").map(str::trim) {
            None | Some("") => 7,
            Some(raw) => raw.parse().map_err(|_| {
                LchatError::Config(format!("Invalid log_cleanup_days '{}'", raw))
            })?,
        };

        let log_directory = prefs
            .get("log_directory")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(expand_home)
            .unwrap_or_else(|| Preferences::config_dir().join("logs"));

        let defaults = Keywords::default();
        let keywords = Keywords {
            chat: non_empty(prefs, "keyword").unwrap_or(defaults.chat),
            models: non_empty(prefs, "model_search_keyword").unwrap_or(defaults.models),
            presets: non_empty(prefs, "preset_keyword").unwrap_or(defaults.presets),
        };

        Ok(Settings {
            api_key,
            image_api_key: non_empty(prefs, "dalle_api_key"),
            model,
            temperature,
            system_prompt,
            line_wrap,
            enable_wrapping,
            theme: prefs.get("theme").unwrap_or("light").parse().unwrap_or_default(),
            log_directory,
            log_cleanup_days,
            custom_presets: prefs.get("custom_presets").unwrap_or("{}").to_string(),
            api_base_url: non_empty(prefs, "api_base_url")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            image_endpoint: non_empty(prefs, "image_endpoint")
                .unwrap_or_else(|| DEFAULT_IMAGE_ENDPOINT.to_string()),
            keywords,
            request_timeout: REQUEST_TIMEOUT,
        })
    }

    pub fn chat_endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base_url.trim_end_matches('/'))
    }

    /// Model id without its vendor prefix, e.g. `gpt-4o` for `openai/gpt-4o`.
    pub fn model_short_name(&self) -> &str {
        self.model.rsplit('/').next().unwrap_or(&self.model)
    }
}

/// Tracing filter directive for the `logging_level` preference.
pub fn logging_level(prefs: &Preferences) -> &'static str {
    match prefs
        .get("logging_level")
        .unwrap_or("INFO")
        .trim()
        .to_uppercase()
        .as_str()
    {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "WARN" | "WARNING" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}

fn required<'a>(prefs: &'a Preferences, key: &str) -> Result<&'a str, LchatError> {
    prefs
        .get(key)
        .ok_or_else(|| LchatError::Config(format!("Missing preference '{}'", key)))
}

fn non_empty(prefs: &Preferences, key: &str) -> Option<String> {
    prefs
        .get(key)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    }
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn base() -> Preferences {
        Preferences::from_pairs([
            ("api_key", "sk-test"),
            ("model", "openai/gpt-x"),
            ("temperature", "0.5"),
            ("system_prompt", "You are helpful"),
            ("line_wrap", "40"),
        ])
    }

    #[test]
    fn parses_required_and_defaults() {
        let settings = Settings::from_preferences(&base()).unwrap();
        assert_eq!(settings.api_key, "sk-test");
        assert_eq!(settings.model_short_name(), "gpt-x");
        assert_eq!(settings.temperature, 0.5);
        assert_eq!(settings.line_wrap, 40);
        assert!(settings.enable_wrapping);
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.log_cleanup_days, 7);
        assert_eq!(settings.custom_presets, "{}");
        assert_eq!(settings.keywords, Keywords::default());
        assert!(settings.image_api_key.is_none());
        assert_eq!(
            settings.chat_endpoint(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
    }

    #[test]
    fn bad_temperature_is_config_error() {
        let mut prefs = base();
        prefs.set("temperature", "warm");
        let err = Settings::from_preferences(&prefs).unwrap_err();
        assert!(matches!(err, LchatError::Config(_)));
        assert_eq!(err.title(), "Failed to parse preferences");

        prefs.set("temperature", "3.5");
        assert!(Settings::from_preferences(&prefs).is_err());
    }

    #[test]
    fn missing_model_is_config_error() {
        let prefs = Preferences::from_pairs([
            ("api_key", "sk-test"),
            ("temperature", "0.5"),
            ("system_prompt", "x"),
        ]);
        let err = Settings::from_preferences(&prefs).unwrap_err();
        assert!(err.to_string().contains("model"));
    }

    #[test]
    fn non_numeric_wrap_disables_wrapping() {
        let mut prefs = base();
        prefs.set("line_wrap", "wide");
        assert_eq!(Settings::from_preferences(&prefs).unwrap().line_wrap, 0);
        prefs.set("line_wrap", "-5");
        assert_eq!(Settings::from_preferences(&prefs).unwrap().line_wrap, 0);
    }

    #[test]
    fn bad_cleanup_days_is_config_error() {
        let mut prefs = base();
        prefs.set("log_cleanup_days", "weekly");
        assert!(Settings::from_preferences(&prefs).is_err());
        prefs.set("log_cleanup_days", "0");
        assert_eq!(
            Settings::from_preferences(&prefs).unwrap().log_cleanup_days,
            0
        );
    }

    #[test]
    fn yaml_scalars_become_strings() {
        let prefs = Preferences::from_yaml(
            "api_key: sk\nmodel: openai/gpt-x\ntemperature: 0.25\nline_wrap: 60\n\
             enable_wrapping: false\nsystem_prompt: Be brief\ndalle_api_key:\n",
        )
        .unwrap();
        assert_eq!(prefs.get("temperature"), Some("0.25"));
        assert_eq!(prefs.get("line_wrap"), Some("60"));
        assert_eq!(prefs.get("enable_wrapping"), Some("false"));
        assert_eq!(prefs.get("dalle_api_key"), Some(""));

        let settings = Settings::from_preferences(&prefs).unwrap();
        assert!(!settings.enable_wrapping);
        assert_eq!(settings.line_wrap, 60);
    }

    #[test]
    fn yaml_must_be_a_mapping() {
        assert!(Preferences::from_yaml("- a\n- b\n").is_err());
        assert_eq!(Preferences::from_yaml("").unwrap(), Preferences::default());
    }

    #[test]
    fn overrides_split_on_first_equals() {
        let mut prefs = base();
        prefs
            .apply_override("custom_presets={\"a\":\"b=c\"}")
            .unwrap();
        assert_eq!(prefs.get("custom_presets"), Some("{\"a\":\"b=c\"}"));
        assert!(prefs.apply_override("no-equals").is_err());
    }

    #[test]
    fn save_and_load_round_trip_through_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.yaml");
        let prefs = Preferences::defaults();
        prefs.save(&path).unwrap();

        let loaded = Preferences::load(Some(&path)).unwrap();
        assert_eq!(loaded, prefs);
    }

    #[test]
    fn malformed_yaml_is_reportable_not_fatal() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("bad.yaml");
        fs::write(&path, "a: [unclosed\n").unwrap();

        let prefs = Preferences::load_with_overrides(Some(&path), &[]).unwrap();

        let err = prefs.unwrap_err();
        assert!(matches!(err, LchatError::Config(_)));
        assert_eq!(err.title(), "Failed to parse preferences");
    }

    #[test]
    fn unreadable_file_is_fatal() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("missing.yaml");

        let err = Preferences::load_with_overrides(Some(&missing), &[]).unwrap_err();
        assert!(matches!(err, LchatError::Io { .. }));
    }

    #[test]
    fn overrides_apply_after_loading() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "model: a/b\ntheme: light\n").unwrap();

        let prefs = Preferences::load_with_overrides(Some(&path), &["theme=dark".to_string()])
            .unwrap()
            .unwrap();
        assert_eq!(prefs.get("theme"), Some("dark"));
        assert_eq!(prefs.get("model"), Some("a/b"));

        let bad = Preferences::load_with_overrides(Some(&path), &["theme".to_string()]).unwrap();
        assert!(matches!(bad, Err(LchatError::Input(_))));
    }

    #[test]
    fn default_file_is_seeded_once() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join(".lchat").join("config.yaml");

        assert!(Preferences::seed_default_file(&path).unwrap());
        fs::write(&path, "model: mine/model\n").unwrap();
        assert!(!Preferences::seed_default_file(&path).unwrap());

        let loaded = Preferences::load(Some(&path)).unwrap();
        assert_eq!(loaded.get("model"), Some("mine/model"));
    }

    #[test]
    fn logging_level_maps_python_style_names() {
        let mut prefs = base();
        prefs.set("logging_level", "warning");
        assert_eq!(logging_level(&prefs), "warn");
        prefs.set("logging_level", "DEBUG");
        assert_eq!(logging_level(&prefs), "debug");
        prefs.set("logging_level", "loud");
        assert_eq!(logging_level(&prefs), "info");
    }

    #[test]
    fn home_prefix_is_expanded() {
        let mut prefs = base();
        prefs.set("log_directory", "~/notes/ai");
        let settings = Settings::from_preferences(&prefs).unwrap();
        assert!(settings.log_directory.ends_with("notes/ai"));
        assert!(!settings.log_directory.starts_with("~"));
    }
}
