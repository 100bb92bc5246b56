use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use cross_xdg::BaseDirs;
use serde::Deserialize;
use tracing::{debug, warn};

/// Canonical tape length.
pub const DEFAULT_TAPE_SIZE: usize = 30_000;

/// How runtime conditions (pointer out of range, read with empty input) are handled.
///
/// The choice applies to both conditions at once; there is no per-instruction mix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Abort the run with an error.
    #[default]
    Strict,
    /// Ignore the instruction and continue.
    Permissive,
}

/// How input text is turned into the byte queue read by `,`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// One byte per whitespace-delimited token: the token's first byte.
    #[default]
    Tokens,
    /// Every byte of the text, in order.
    Stream,
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Policy::Strict),
            "permissive" => Ok(Policy::Permissive),
            other => Err(format!("unknown policy '{other}' (expected strict|permissive)")),
        }
    }
}

impl FromStr for InputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tokens" => Ok(InputMode::Tokens),
            "stream" => Ok(InputMode::Stream),
            other => Err(format!("unknown input mode '{other}' (expected tokens|stream)")),
        }
    }
}

/// Everything the tape machine itself needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineConfig {
    pub tape_size: usize,
    pub policy: Policy,
    pub input_mode: InputMode,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            tape_size: DEFAULT_TAPE_SIZE,
            policy: Policy::Strict,
            input_mode: InputMode::Tokens,
        }
    }
}

/// Errors raised while resolving settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("tape_size must be > 0")]
    ZeroTapeSize,
}

/// CLI settings, read from `bf.toml` and the environment.
///
/// Missing fields default to the canonical machine (30,000 cells, strict,
/// token input) with no wall-clock timeout and no step limit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tape_size: usize,
    pub policy: Policy,
    pub input_mode: InputMode,
    pub timeout_ms: Option<u64>,
    pub max_steps: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        let machine = MachineConfig::default();
        Self {
            tape_size: machine.tape_size,
            policy: machine.policy,
            input_mode: machine.input_mode,
            timeout_ms: None,
            max_steps: None,
        }
    }
}

impl Settings {
    /// Resolve settings: config file -> environment -> defaults.
    ///
    /// CLI flags are layered on top by the caller.
    pub fn load() -> Result<Settings, ConfigError> {
        let mut settings = match config_path() {
            Some(path) => load_file(&path)?,
            None => Settings::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml_str(content: &str, path: &Path) -> Result<Settings, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override fields from `BF_*` variables. Unparsable values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: FromStr>(key: &str, raw: Option<String>) -> Option<T> {
            let raw = raw?;
            match raw.parse::<T>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(key, value = %raw, "ignoring unparsable environment value");
                    None
                }
            }
        }

        if let Some(v) = parsed("BF_TAPE_SIZE", lookup("BF_TAPE_SIZE")) {
            self.tape_size = v;
        }
        if let Some(v) = parsed("BF_POLICY", lookup("BF_POLICY")) {
            self.policy = v;
        }
        if let Some(v) = parsed("BF_INPUT_MODE", lookup("BF_INPUT_MODE")) {
            self.input_mode = v;
        }
        if let Some(v) = parsed("BF_TIMEOUT_MS", lookup("BF_TIMEOUT_MS")) {
            self.timeout_ms = Some(v);
        }
        if let Some(v) = parsed("BF_MAX_STEPS", lookup("BF_MAX_STEPS")) {
            self.max_steps = Some(v);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tape_size == 0 {
            return Err(ConfigError::ZeroTapeSize);
        }
        Ok(())
    }

    pub fn machine(&self) -> MachineConfig {
        MachineConfig {
            tape_size: self.tape_size,
            policy: self.policy,
            input_mode: self.input_mode,
        }
    }
}

/// `BF_CONFIG` if set, otherwise `<config home>/bf.toml`.
fn config_path() -> Option<PathBuf> {
    if let Some(explicit) = std::env::var_os("BF_CONFIG") {
        return Some(PathBuf::from(explicit));
    }

    // On Linux: resolves to /home/<user>/.config
    // On Windows: resolves to C:\Users\<user>\.config
    // On macOS: resolves to /Users/<user>/.config
    let base_dirs = BaseDirs::new().ok()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("bf.toml");
    Some(path)
}

fn load_file(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = Settings::from_toml_str(&content, path)?;
    debug!(path = %path.display(), ?settings, "loaded config file");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_canonical_machine() {
        let s = Settings::default();
        assert_eq!(s.tape_size, 30_000);
        assert_eq!(s.policy, Policy::Strict);
        assert_eq!(s.input_mode, InputMode::Tokens);
        assert_eq!(s.timeout_ms, None);
        assert_eq!(s.max_steps, None);
        assert_eq!(s.machine(), MachineConfig::default());
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_fields() {
        let s = Settings::from_toml_str(
            "tape_size = 16\npolicy = \"permissive\"\n",
            Path::new("bf.toml"),
        )
        .unwrap();
        assert_eq!(s.tape_size, 16);
        assert_eq!(s.policy, Policy::Permissive);
        assert_eq!(s.input_mode, InputMode::Tokens);
        assert_eq!(s.timeout_ms, None);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Settings::from_toml_str("policy = \"loose\"", Path::new("bf.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut s = Settings::from_toml_str("tape_size = 16", Path::new("bf.toml")).unwrap();
        s.apply_env(env(&[
            ("BF_TAPE_SIZE", "64"),
            ("BF_INPUT_MODE", "stream"),
            ("BF_MAX_STEPS", "500"),
            ("BF_TIMEOUT_MS", "250"),
        ]));
        assert_eq!(s.tape_size, 64);
        assert_eq!(s.input_mode, InputMode::Stream);
        assert_eq!(s.max_steps, Some(500));
        assert_eq!(s.timeout_ms, Some(250));
    }

    #[test]
    fn timeout_is_opt_in() {
        let unset = Settings::from_toml_str("tape_size = 16", Path::new("bf.toml")).unwrap();
        assert_eq!(unset.timeout_ms, None);

        let set = Settings::from_toml_str("timeout_ms = 1500", Path::new("bf.toml")).unwrap();
        assert_eq!(set.timeout_ms, Some(1_500));
    }

    #[test]
    fn unparsable_env_values_are_ignored() {
        let mut s = Settings::default();
        s.apply_env(env(&[("BF_TAPE_SIZE", "lots"), ("BF_POLICY", "sometimes")]));
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn zero_tape_size_is_rejected() {
        let s = Settings {
            tape_size: 0,
            ..Settings::default()
        };
        assert!(matches!(s.validate(), Err(ConfigError::ZeroTapeSize)));
    }

    #[test]
    fn policy_and_mode_parse_case_insensitively() {
        assert_eq!("Permissive".parse::<Policy>(), Ok(Policy::Permissive));
        assert_eq!(" STREAM ".parse::<InputMode>(), Ok(InputMode::Stream));
        assert!("maybe".parse::<Policy>().is_err());
    }
}
