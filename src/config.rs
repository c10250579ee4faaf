use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use directories::ProjectDirs;
use regex::Regex;
use serde::{Deserialize, Deserializer};

use crate::render::Symbols;

/// Environment variable that points at the config file.
pub const CONFIG_PATH_ENV: &str = "NIRI_WINDOWS_CONFIG";

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub mode: Mode,
    pub symbols: Symbols,
    /// Output (DP-1, HDMI-A-1, etc.) that this indicator is for.
    ///
    /// Unset means the output of the focused workspace.
    pub output: Option<String>,
    /// Text shown when there are no windows to show.
    pub empty: String,
    pub rules: Vec<WindowRule>,
}

/// How the bar shows the windows.
#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One symbol per window.
    #[default]
    Text,
    /// One box per window, laid out in columns.
    Graphical,
}

/// Adds a class to matching tiles in the graphical view.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct WindowRule {
    #[serde(deserialize_with = "non_empty_regex")]
    pub app_id: Option<RegexEq>,
    #[serde(deserialize_with = "non_empty_regex")]
    pub title: Option<RegexEq>,
    pub class: String,
    /// Keep looking at the following rules after this one matched.
    pub r#continue: bool,
}

/// `Regex` that implements `PartialEq` by its string form.
#[derive(Debug, Clone)]
pub struct RegexEq(pub Regex);

impl PartialEq for RegexEq {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl Eq for RegexEq {}

impl FromStr for RegexEq {
    type Err = <Regex as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Regex::from_str(s).map(Self)
    }
}

// An empty pattern means "match anything", same as leaving the key out.
fn non_empty_regex<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<RegexEq>, D::Error> {
    let Some(pattern) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if pattern.is_empty() {
        return Ok(None);
    }
    pattern.parse().map(Some).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigPath {
    /// Explicitly set config path.
    ///
    /// Load the config only from this path, it must exist.
    Explicit(PathBuf),

    /// Default config path, usually `$XDG_CONFIG_HOME/niri-windows/config.json`.
    ///
    /// A missing file means the default config.
    Regular(PathBuf),
}

impl ConfigPath {
    /// Picks the config path from the command line, the environment, or the default location.
    pub fn new(cli: Option<PathBuf>) -> anyhow::Result<Self> {
        if let Some(path) = cli {
            return Ok(Self::Explicit(path));
        }

        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(Self::Explicit(PathBuf::from(path)));
        }

        let mut path = ProjectDirs::from("", "", "niri-windows")
            .context("error retrieving home directory")?
            .config_dir()
            .to_owned();
        path.push("config.json");
        Ok(Self::Regular(path))
    }

    pub fn path(&self) -> &Path {
        match self {
            ConfigPath::Explicit(path) => path,
            ConfigPath::Regular(path) => path,
        }
    }

    pub fn load(&self) -> anyhow::Result<Config> {
        match self {
            ConfigPath::Explicit(path) => Config::load(path),
            ConfigPath::Regular(path) => {
                if path.exists() {
                    Config::load(path)
                } else {
                    debug!("{path:?} does not exist, using the default config");
                    Ok(Config::default())
                }
            }
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("error reading {path:?}"))?;

        let config = Self::parse(&contents).context("error parsing")?;
        debug!("loaded config from {path:?}");
        Ok(config)
    }

    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[track_caller]
    fn check(text: &str, expected: Config) {
        let parsed = Config::parse(text).unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn parse() {
        check(
            r#"{
                "mode": "graphical",
                "symbols": {
                    "unfocused": "o",
                    "focused-floating": "F"
                },
                "output": "eDP-1",
                "empty": "-",
                "rules": [
                    { "app-id": "^firefox$", "class": "browser" },
                    { "title": "YouTube", "class": "video", "continue": true },
                    { "app-id": "", "title": "", "class": "any" }
                ]
            }"#,
            Config {
                mode: Mode::Graphical,
                symbols: Symbols {
                    unfocused: String::from("o"),
                    focused_floating: String::from("F"),
                    ..Symbols::default()
                },
                output: Some(String::from("eDP-1")),
                empty: String::from("-"),
                rules: vec![
                    WindowRule {
                        app_id: Some("^firefox$".parse().unwrap()),
                        title: None,
                        class: String::from("browser"),
                        r#continue: false,
                    },
                    WindowRule {
                        app_id: None,
                        title: Some("YouTube".parse().unwrap()),
                        class: String::from("video"),
                        r#continue: true,
                    },
                    WindowRule {
                        app_id: None,
                        title: None,
                        class: String::from("any"),
                        r#continue: false,
                    },
                ],
            },
        );
    }

    #[test]
    fn parse_empty_object_is_default() {
        check("{}", Config::default());
    }

    #[test]
    fn default_symbols() {
        let symbols = Config::default().symbols;
        assert_eq!(symbols.unfocused, "⋅");
        assert_eq!(symbols.focused, "⊙");
        assert_eq!(symbols.unfocused_floating, "∗");
        assert_eq!(symbols.focused_floating, "⊛");
    }

    #[test]
    fn reject_bad_regex() {
        let err = Config::parse(r#"{ "rules": [{ "app-id": "(" }] }"#).unwrap_err();
        assert!(err.to_string().contains("regex"), "{err}");
    }

    #[test]
    fn parse_mode() {
        check(
            r#"{ "mode": "text" }"#,
            Config {
                mode: Mode::Text,
                ..Config::default()
            },
        );

        let err = Config::parse(r#"{ "mode": "icons" }"#).unwrap_err();
        assert!(err.to_string().contains("unknown variant"), "{err}");
    }

    #[test]
    fn reject_unknown_keys() {
        assert!(Config::parse(r#"{ "mode": "text", "colour": 1 }"#).is_err());
        assert!(Config::parse(r#"{ "symbols": { "urgent": "!" } }"#).is_err());
    }

    #[test]
    fn explicit_path_must_exist() {
        let path = ConfigPath::Explicit(PathBuf::from("/nonexistent/niri-windows.json"));
        assert!(path.load().is_err());

        let path = ConfigPath::Regular(PathBuf::from("/nonexistent/niri-windows.json"));
        assert_eq!(path.load().unwrap(), Config::default());
    }
}
