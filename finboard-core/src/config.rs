//! Configuration management
//!
//! Settings live in `settings.json` inside the application directory:
//! ```json
//! {
//!   "app": {
//!     "authMode": "remote",
//!     "privilegePolicy": "failOpen",
//!     "redirectDelayMs": 2000
//!   }
//! }
//! ```
//! Keys the CLI does not manage are preserved on save. The remote service
//! URL and anon key only come from the environment.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::adapters::supabase::{
    PLACEHOLDER_ANON_KEY, PLACEHOLDER_URL, SUPABASE_ANON_KEY_ENV, SUPABASE_URL_ENV,
};
use crate::domain::{PrivilegePolicy, DEFAULT_PRIVILEGE_POLICY};

/// Environment variable forcing the auth mode ("remote" or "local")
pub const AUTH_MODE_ENV: &str = "FINBOARD_AUTH_MODE";

/// How long a page shows its success message before redirecting
pub const DEFAULT_REDIRECT_DELAY_MS: u64 = 2000;

/// Which session backend and data store the context is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Remote auth, rows and storage
    Remote,
    /// Fixed test credential with the offline DuckDB store
    Local,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Remote => "remote",
            AuthMode::Local => "local",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "remote" => Some(AuthMode::Remote),
            "local" | "offline" => Some(AuthMode::Local),
            _ => None,
        }
    }
}

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_mode: Option<AuthMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    privilege_policy: Option<PrivilegePolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    redirect_delay_ms: Option<u64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Finboard configuration (resolved view of settings and environment)
#[derive(Debug, Clone)]
pub struct Config {
    pub auth_mode: AuthMode,
    pub privilege_policy: PrivilegePolicy,
    pub redirect_delay: Duration,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Whether `auth_mode` was pinned in settings (as opposed to inferred)
    auth_mode_pinned: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(SettingsFile::default(), |_| None)
    }
}

impl Config {
    /// Load config from the application directory
    ///
    /// Auth mode is picked from, in order:
    /// 1. `FINBOARD_AUTH_MODE`
    /// 2. `app.authMode` in settings.json (`fb offline on|off`)
    /// 3. remote when a real service URL is configured, local otherwise
    pub fn load(finboard_dir: &Path) -> Result<Self> {
        let raw = read_settings(finboard_dir)?;
        Ok(Self::resolve(raw, |key| std::env::var(key).ok()))
    }

    fn resolve(raw: SettingsFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let supabase_url = env(SUPABASE_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| PLACEHOLDER_URL.to_string());
        let supabase_anon_key = env(SUPABASE_ANON_KEY_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| PLACEHOLDER_ANON_KEY.to_string());

        let inferred = if supabase_url == PLACEHOLDER_URL {
            AuthMode::Local
        } else {
            AuthMode::Remote
        };
        let auth_mode = env(AUTH_MODE_ENV)
            .as_deref()
            .and_then(AuthMode::parse)
            .or(raw.app.auth_mode)
            .unwrap_or(inferred);

        Self {
            auth_mode,
            privilege_policy: raw.app.privilege_policy.unwrap_or(DEFAULT_PRIVILEGE_POLICY),
            redirect_delay: Duration::from_millis(
                raw.app.redirect_delay_ms.unwrap_or(DEFAULT_REDIRECT_DELAY_MS),
            ),
            supabase_url,
            supabase_anon_key,
            auth_mode_pinned: raw.app.auth_mode.is_some(),
        }
    }

    /// Save config to the application directory
    /// Preserves other settings that the CLI doesn't manage
    pub fn save(&self, finboard_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(finboard_dir)?;
        let mut settings = read_settings(finboard_dir)?;

        if self.auth_mode_pinned {
            settings.app.auth_mode = Some(self.auth_mode);
        }
        settings.app.privilege_policy = Some(self.privilege_policy);
        settings.app.redirect_delay_ms = Some(self.redirect_delay.as_millis() as u64);

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(finboard_dir.join("settings.json"), content)?;
        Ok(())
    }

    /// Pin the auth mode so it survives the next load
    pub fn set_auth_mode(&mut self, mode: AuthMode) {
        self.auth_mode = mode;
        self.auth_mode_pinned = true;
    }

    /// Whether a real remote service is configured (not the placeholders)
    pub fn has_remote_credentials(&self) -> bool {
        self.supabase_url != PLACEHOLDER_URL && self.supabase_anon_key != PLACEHOLDER_ANON_KEY
    }
}

fn read_settings(finboard_dir: &Path) -> Result<SettingsFile> {
    let settings_path = finboard_dir.join("settings.json");
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)?;
    Ok(serde_json::from_str(&content).unwrap_or_default())
}
