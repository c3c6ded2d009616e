//! Configuration parsing and management.

use crate::markdown::DEFAULT_UNRESOLVED_CLASS;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Main configuration struct matching the minwiki.yml schema
///
/// Built once at startup and passed by reference to the renderer and the
/// build; nothing mutates it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// CSS class for wikilinks to titles no document carries
    #[serde(default = "default_unresolved_class")]
    pub unresolved_link_class: String,

    /// Regexes matched against content-relative paths of skipped files
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_base_url() -> String {
    String::from("/")
}

fn default_unresolved_class() -> String {
    DEFAULT_UNRESOLVED_CLASS.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_title")]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub author: Option<String>,
}

fn default_site_title() -> String {
    String::from("Notes")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_content")]
    pub content: PathBuf,

    #[serde(default = "default_static", rename = "static")]
    pub static_dir: PathBuf,

    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_content() -> PathBuf {
    PathBuf::from("content")
}

fn default_static() -> PathBuf {
    PathBuf::from("static")
}

fn default_output() -> PathBuf {
    PathBuf::from("output")
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Load configuration from YAML text (paths resolve against the working directory)
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config at {:?}; using defaults", path);
            Ok(Self::default())
        }
    }

    /// Get the content directory, resolved relative to config file
    pub fn content_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.content)
    }

    /// Get the static assets directory, resolved relative to config file
    pub fn static_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.static_dir)
    }

    /// Get the output directory, resolved relative to config file
    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.output)
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(parent) = self.config_path.as_ref().and_then(|p| p.parent()) {
            parent.join(path)
        } else {
            path.to_path_buf()
        }
    }

    /// Normalized base URL with leading and trailing slash ("/foo/" or "/")
    pub fn normalized_base_url(&self) -> String {
        normalize_base_url(&self.base_url)
    }

    /// Compile `ignore_patterns`, skipping (and warning about) invalid ones
    pub fn ignore_regexes(&self) -> Vec<Regex> {
        let mut compiled = Vec::new();
        for pat in &self.ignore_patterns {
            match Regex::new(pat) {
                Ok(re) => compiled.push(re),
                Err(err) => tracing::warn!("Invalid ignore pattern '{}': {}", pat, err),
            }
        }
        compiled
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            paths: PathsConfig::default(),
            base_url: default_base_url(),
            unresolved_link_class: default_unresolved_class(),
            ignore_patterns: Vec::new(),
            config_path: None,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_site_title(),
            description: None,
            author: None,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content: default_content(),
            static_dir: default_static(),
            output: default_output(),
        }
    }
}

/// Ensure base URLs have a leading and trailing slash
///
/// Absolute URLs (`https://host/path`) keep their scheme and host and only
/// gain a trailing slash.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "/".to_string();
    }

    if let Some((scheme, rest)) = trimmed.split_once("://") {
        let mut path = rest.to_string();
        while path.contains("//") {
            path = path.replace("//", "/");
        }
        if !path.ends_with('/') {
            path.push('/');
        }
        return format!("{}://{}", scheme, path);
    }

    let mut s = trimmed.to_string();
    if !s.starts_with('/') {
        s.insert(0, '/');
    }
    if !s.ends_with('/') {
        s.push('/');
    }

    while s.contains("//") {
        s = s.replace("//", "/");
    }

    s
}
