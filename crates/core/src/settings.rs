//! Typed user preferences over a swappable key-value store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::warn;

use crate::domain::boa_request::RequesterId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKey {
    CookieConsent,
    Theme,
    LastRollNo,
}

impl SettingKey {
    pub const ALL: [Self; 3] = [Self::CookieConsent, Self::Theme, Self::LastRollNo];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CookieConsent => "cookie_consent",
            Self::Theme => "theme",
            Self::LastRollNo => "last_roll_no",
        }
    }

    /// Checks a raw value against the key's schema and returns its stored form.
    pub fn normalize(self, raw: &str) -> Result<String, SettingsError> {
        let invalid = || SettingsError::InvalidValue { key: self, value: raw.to_string() };
        match self {
            Self::CookieConsent => {
                raw.parse::<CookieConsent>().map(|value| value.as_str().to_string()).map_err(|_| invalid())
            }
            Self::Theme => raw.parse::<Theme>().map(|value| value.as_str().to_string()).map_err(|_| invalid()),
            Self::LastRollNo => RequesterId::parse(raw).map(|id| id.0).map_err(|_| invalid()),
        }
    }
}

impl std::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SettingKey {
    type Err = SettingsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == normalized)
            .ok_or_else(|| SettingsError::UnknownKey(value.to_string()))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CookieConsent {
    #[default]
    Unset,
    Accepted,
    Declined,
}

impl CookieConsent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }
}

impl std::str::FromStr for CookieConsent {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "unset" => Ok(Self::Unset),
            "accepted" | "accept" | "true" => Ok(Self::Accepted),
            "declined" | "decline" | "false" => Ok(Self::Declined),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Self::System),
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("unknown setting `{0}` (expected cookie_consent|theme|last_roll_no)")]
    UnknownKey(String),
    #[error("invalid value `{value}` for setting `{key}`")]
    InvalidValue { key: SettingKey, value: String },
    #[error("settings backend failure: {0}")]
    Backend(String),
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: SettingKey) -> Result<Option<String>, SettingsError>;
    async fn put(&self, key: SettingKey, value: &str) -> Result<(), SettingsError>;
    async fn remove(&self, key: SettingKey) -> Result<(), SettingsError>;
    async fn entries(&self) -> Result<Vec<(SettingKey, String)>, SettingsError>;
}

#[derive(Default)]
pub struct InMemorySettingsStore {
    values: RwLock<BTreeMap<SettingKey, String>>,
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn get(&self, key: SettingKey) -> Result<Option<String>, SettingsError> {
        Ok(self.values.read().await.get(&key).cloned())
    }

    async fn put(&self, key: SettingKey, value: &str) -> Result<(), SettingsError> {
        self.values.write().await.insert(key, value.to_string());
        Ok(())
    }

    async fn remove(&self, key: SettingKey) -> Result<(), SettingsError> {
        self.values.write().await.remove(&key);
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<(SettingKey, String)>, SettingsError> {
        Ok(self.values.read().await.iter().map(|(key, value)| (*key, value.clone())).collect())
    }
}

/// Effective preferences: stored values with defaults for missing or unreadable ones.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Preferences {
    pub cookie_consent: CookieConsent,
    pub theme: Theme,
    pub last_roll_no: Option<RequesterId>,
}

impl Preferences {
    pub async fn load(store: &dyn SettingsStore) -> Result<Self, SettingsError> {
        let mut preferences = Self::default();

        if let Some(raw) = store.get(SettingKey::CookieConsent).await? {
            match raw.parse() {
                Ok(value) => preferences.cookie_consent = value,
                Err(()) => warn_corrupt(SettingKey::CookieConsent, &raw),
            }
        }
        if let Some(raw) = store.get(SettingKey::Theme).await? {
            match raw.parse() {
                Ok(value) => preferences.theme = value,
                Err(()) => warn_corrupt(SettingKey::Theme, &raw),
            }
        }
        if let Some(raw) = store.get(SettingKey::LastRollNo).await? {
            match RequesterId::parse(&raw) {
                Ok(value) => preferences.last_roll_no = Some(value),
                Err(_) => warn_corrupt(SettingKey::LastRollNo, &raw),
            }
        }

        Ok(preferences)
    }

    pub fn value_of(&self, key: SettingKey) -> String {
        match key {
            SettingKey::CookieConsent => self.cookie_consent.as_str().to_string(),
            SettingKey::Theme => self.theme.as_str().to_string(),
            SettingKey::LastRollNo => {
                self.last_roll_no.as_ref().map(|id| id.0.clone()).unwrap_or_default()
            }
        }
    }
}

/// Validates and stores a raw value, returning the stored form.
pub async fn save_setting(
    store: &dyn SettingsStore,
    key: SettingKey,
    raw: &str,
) -> Result<String, SettingsError> {
    let value = key.normalize(raw)?;
    store.put(key, &value).await?;
    Ok(value)
}

pub async fn remember_roll_no(
    store: &dyn SettingsStore,
    requester: &RequesterId,
) -> Result<(), SettingsError> {
    store.put(SettingKey::LastRollNo, requester.as_str()).await
}

fn warn_corrupt(key: SettingKey, raw: &str) {
    warn!(
        event_name = "boa.settings.corrupt_value",
        key = key.as_str(),
        value = raw,
        "ignoring unreadable setting, using default"
    );
}

#[cfg(test)]
mod tests {
    use super::{
        remember_roll_no, save_setting, CookieConsent, InMemorySettingsStore, Preferences,
        SettingKey, SettingsError, SettingsStore, Theme,
    };
    use crate::domain::boa_request::RequesterId;

    #[tokio::test]
    async fn missing_values_fall_back_to_defaults() {
        let store = InMemorySettingsStore::default();
        let preferences = Preferences::load(&store).await.expect("load");

        assert_eq!(preferences, Preferences::default());
        assert_eq!(preferences.cookie_consent, CookieConsent::Unset);
        assert_eq!(preferences.theme, Theme::System);
        assert_eq!(preferences.last_roll_no, None);
    }

    #[tokio::test]
    async fn corrupt_values_fall_back_to_defaults() {
        let store = InMemorySettingsStore::default();
        store.put(SettingKey::Theme, "neon").await.expect("raw put");
        store.put(SettingKey::CookieConsent, "accepted").await.expect("raw put");

        let preferences = Preferences::load(&store).await.expect("load");

        assert_eq!(preferences.theme, Theme::System);
        assert_eq!(preferences.cookie_consent, CookieConsent::Accepted);
    }

    #[tokio::test]
    async fn save_setting_validates_against_schema() {
        let store = InMemorySettingsStore::default();

        let stored = save_setting(&store, SettingKey::Theme, " Dark ").await.expect("valid theme");
        assert_eq!(stored, "dark");

        let error = save_setting(&store, SettingKey::CookieConsent, "maybe").await;
        assert!(matches!(error, Err(SettingsError::InvalidValue { key: SettingKey::CookieConsent, .. })));
        assert_eq!(store.get(SettingKey::CookieConsent).await.expect("get"), None);
    }

    #[tokio::test]
    async fn remembered_roll_no_round_trips_through_preferences() {
        let store = InMemorySettingsStore::default();
        remember_roll_no(&store, &RequesterId("21CS042".to_string())).await.expect("remember");

        let preferences = Preferences::load(&store).await.expect("load");
        assert_eq!(preferences.last_roll_no, Some(RequesterId("21CS042".to_string())));
        assert_eq!(preferences.value_of(SettingKey::LastRollNo), "21CS042");
    }

    #[test]
    fn setting_keys_parse_from_cli_spellings() {
        assert_eq!("last-roll-no".parse::<SettingKey>().ok(), Some(SettingKey::LastRollNo));
        assert_eq!("THEME".parse::<SettingKey>().ok(), Some(SettingKey::Theme));
        assert!("font_size".parse::<SettingKey>().is_err());
    }
}
