//! Configuration for async-gallery.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (ASYNC_GALLERY_SPEED, ASYNC_GALLERY_SEED,
//!    ASYNC_GALLERY_SCENARIOS)
//! 2. Config file (.async-gallery/config.yaml)
//! 3. Defaults (real-time pacing, entropy seed, built-in scenarios only)
//!
//! Config file discovery:
//! - Searches current directory and parents for .async-gallery/config.yaml
//! - Falls back to the user config directory (e.g. ~/.config/async-gallery/config.yaml)
//! - Paths in config file are relative to the directory holding .async-gallery/

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const CONFIG_DIR: &str = ".async-gallery";
const CONFIG_FILE: &str = "config.yaml";

pub const ENV_SPEED: &str = "ASYNC_GALLERY_SPEED";
pub const ENV_SEED: &str = "ASYNC_GALLERY_SEED";
pub const ENV_SCENARIOS: &str = "ASYNC_GALLERY_SCENARIOS";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub scenarios: ScenariosConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimingConfig {
    pub speed: Option<f64>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenariosConfig {
    /// Directory of extra scenario files (relative to config file)
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayConfig {
    pub show_code: Option<bool>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Simulation clock settings
    pub timing: TimingSettings,
    /// Absolute path to extra scenarios, if any
    pub scenarios_dir: Option<PathBuf>,
    /// Print code samples next to live runs
    pub show_code: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimingSettings {
    /// Time scale; 2.0 runs every scenario at double pace
    pub speed: f64,
    /// RNG seed for jitter and chance outcomes
    pub seed: Option<u64>,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            speed: 1.0,
            seed: None,
        }
    }
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    // User-level config
    let user_config = dirs::config_dir()?.join("async-gallery").join(CONFIG_FILE);
    user_config.exists().then_some(user_config)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Check a time scale from any source (file, env, command line)
pub fn validate_speed(speed: f64, source: &str) -> Result<f64> {
    if !speed.is_finite() || speed <= 0.0 {
        bail!("{} must be a positive number, got {}", source, speed);
    }
    Ok(speed)
}

/// Resolve configuration starting the file search at `start`, reading
/// environment variables through `env`
fn resolve(start: &Path, env: impl Fn(&str) -> Option<String>) -> Result<ResolvedConfig> {
    let config_file = find_config_file(start);

    let (mut timing, mut scenarios_dir, show_code) = if let Some(ref config_path) = config_file {
        let config = load_config_file(config_path)?;

        // Base directory is the parent of .async-gallery/
        let base_dir = config_path
            .parent()
            .and_then(|p| p.parent())
            .unwrap_or(Path::new("."));

        let timing = TimingSettings {
            speed: match config.timing.speed {
                Some(speed) => validate_speed(speed, "timing.speed")?,
                None => 1.0,
            },
            seed: config.timing.seed,
        };
        let scenarios_dir = config
            .scenarios
            .dir
            .as_deref()
            .map(|dir| resolve_path(base_dir, dir));

        (timing, scenarios_dir, config.display.show_code.unwrap_or(false))
    } else {
        (TimingSettings::default(), None, false)
    };

    if let Some(raw) = env(ENV_SPEED) {
        let speed: f64 = raw
            .trim()
            .parse()
            .with_context(|| format!("{} is not a number: {}", ENV_SPEED, raw))?;
        timing.speed = validate_speed(speed, ENV_SPEED)?;
    }

    if let Some(raw) = env(ENV_SEED) {
        let seed = raw
            .trim()
            .parse()
            .with_context(|| format!("{} is not an unsigned integer: {}", ENV_SEED, raw))?;
        timing.seed = Some(seed);
    }

    if let Some(dir) = env(ENV_SCENARIOS) {
        scenarios_dir = Some(PathBuf::from(dir));
    }

    Ok(ResolvedConfig {
        config_file,
        timing,
        scenarios_dir,
        show_code,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    resolve(&cwd, |key| std::env::var(key).ok())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => bail!("{}", e),
    }
}

/// Resolve configuration again, bypassing the cache
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(root: &Path, body: &str) -> PathBuf {
        let dir = root.join(CONFIG_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", body).unwrap();
        path
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            temp.path(),
            r#"
version: "1.0"
timing:
  speed: 4.0
  seed: 42
scenarios:
  dir: ./scenarios
display:
  show_code: true
"#,
        );

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.timing.speed, Some(4.0));
        assert_eq!(config.timing.seed, Some(42));
        assert_eq!(config.scenarios.dir, Some("./scenarios".to_string()));
        assert_eq!(config.display.show_code, Some(true));
    }

    #[test]
    fn test_resolve_discovers_file_in_parent() {
        let temp = TempDir::new().unwrap();
        write_config(
            temp.path(),
            r#"
version: "1.0"
timing:
  speed: 2.0
scenarios:
  dir: scenarios
"#,
        );
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let config = resolve(&nested, no_env).unwrap();

        assert!(config.config_file.is_some());
        assert_eq!(config.timing.speed, 2.0);
        assert_eq!(config.timing.seed, None);
        assert_eq!(config.scenarios_dir, Some(temp.path().join("scenarios")));
        assert!(!config.show_code);
    }

    #[test]
    fn test_env_overrides_file() {
        let temp = TempDir::new().unwrap();
        write_config(
            temp.path(),
            r#"
version: "1.0"
timing:
  speed: 2.0
  seed: 1
"#,
        );
        let env: HashMap<&str, &str> = [(ENV_SPEED, "10"), (ENV_SEED, "99"), (ENV_SCENARIOS, "/tmp/extra")]
            .into_iter()
            .collect();

        let config = resolve(temp.path(), |key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.timing.speed, 10.0);
        assert_eq!(config.timing.seed, Some(99));
        assert_eq!(config.scenarios_dir, Some(PathBuf::from("/tmp/extra")));
    }

    #[test]
    fn test_invalid_speed_rejected() {
        let temp = TempDir::new().unwrap();
        write_config(
            temp.path(),
            r#"
version: "1.0"
timing:
  speed: -1.0
"#,
        );
        assert!(resolve(temp.path(), no_env).is_err());

        let bad_env = |key: &str| (key == ENV_SPEED).then(|| "fast".to_string());
        let other = TempDir::new().unwrap();
        write_config(other.path(), "version: \"1.0\"");
        assert!(resolve(other.path(), bad_env).is_err());
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
