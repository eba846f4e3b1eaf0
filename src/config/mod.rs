//! Configuration loading and management.
//!
//! Loads `~/.rollcall/config.toml` (or `$ROLLCALL_CONFIG_PATH`).
//! Environment variables override file values; file values override defaults.
//!
//! Precedence: env vars > config file > defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::messaging::{DEFAULT_PREAMBLE, DEFAULT_SUBJECT};
use crate::selection::EscrowPolicy;

// ── Top-level config ────────────────────────────────────────────

/// Top-level configuration loaded from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Business identity used in the signature and copy address.
    pub business: BusinessConfig,
    /// Outbound message defaults.
    pub message: MessageConfig,
    /// Selection behavior.
    pub selection: SelectionConfig,
}

impl Config {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// Config file path: `$ROLLCALL_CONFIG_PATH` or `~/.rollcall/config.toml`.
    /// If the file does not exist, returns defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the resulting config fails [`Config::validate`].
    pub fn load() -> Result<Self> {
        let path = Self::config_path_with(|key| std::env::var(key).ok())?;
        Self::load_from(&path)
    }

    /// Load from an explicit path, then apply env overrides.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file only, no env overrides.
    fn load_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                toml::from_str(&contents)
                    .with_context(|| format!("failed to parse config at {}", path.display()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "failed to read config file {}: {e}",
                path.display()
            )),
        }
    }

    /// Resolve config path using a custom env resolver (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if no override is set and the home directory
    /// cannot be resolved.
    pub fn config_path_with(env: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
        if let Some(p) = env("ROLLCALL_CONFIG_PATH") {
            return Ok(PathBuf::from(p));
        }
        Ok(config_dir()?.join("config.toml"))
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function for testability (avoids `set_var` in tests).
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("ROLLCALL_BUSINESS_NAME") {
            self.business.name = v;
        }
        if let Some(v) = env("ROLLCALL_BUSINESS_EMAIL") {
            self.business.email = v;
        }
        if let Some(v) = env("ROLLCALL_RECIPIENT") {
            self.message.default_recipient = Some(v);
        }
        if let Some(v) = env("ROLLCALL_ESCROW_POLICY") {
            match EscrowPolicy::parse(&v) {
                Some(policy) => self.selection.escrow_policy = policy,
                None => tracing::warn!(
                    var = "ROLLCALL_ESCROW_POLICY",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
    }

    /// Check values that defaults cannot repair.
    ///
    /// # Errors
    ///
    /// Returns an error if the business name is blank.
    pub fn validate(&self) -> Result<()> {
        if self.business.name.trim().is_empty() {
            anyhow::bail!("business.name must not be empty");
        }
        Ok(())
    }

    /// Parse a TOML string into config (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).context("failed to parse config TOML")
    }
}

/// Root directory for rollcall state: `~/.rollcall`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be resolved.
pub fn config_dir() -> Result<PathBuf> {
    let base = directories::BaseDirs::new().context("failed to resolve home directory")?;
    Ok(base.home_dir().join(".rollcall"))
}

// ── Business config ─────────────────────────────────────────────

/// Business identity.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BusinessConfig {
    /// Signature line at the end of every body.
    pub name: String,
    /// Copy address added to every message.
    pub email: String,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            name: "Mi Negocio".to_owned(),
            email: String::new(),
        }
    }
}

// ── Message config ──────────────────────────────────────────────

/// Outbound message defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    /// Initial subject line.
    pub subject: String,
    /// Lines opening every body.
    pub preamble: String,
    /// Recipient filled in when a workflow opens.
    pub default_recipient: Option<String>,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            subject: DEFAULT_SUBJECT.to_owned(),
            preamble: DEFAULT_PREAMBLE.to_owned(),
            default_recipient: None,
        }
    }
}

// ── Selection config ────────────────────────────────────────────

/// Selection behavior.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// How new escrow batches combine with held records.
    pub escrow_policy: EscrowPolicy,
}

// ── Tests ───────────────────────────────────────────────────────
