//! Request/result types shared by the scraper and the HTTP API.

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://fr.surebet.com/surebets";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Parameters of one scrape cycle. Every field is optional on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeRequest {
    pub headless: bool,
    pub login_email: Option<String>,
    pub login_password: Option<String>,
    pub login_url: Option<String>,
    #[serde(deserialize_with = "base_url_or_default")]
    pub base_url: String,
    /// Seconds, bounds every navigation.
    #[serde(deserialize_with = "timeout_or_default")]
    pub timeout: u64,
}

impl Default for ScrapeRequest {
    fn default() -> Self {
        Self {
            headless: true,
            login_email: None,
            login_password: None,
            login_url: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

fn base_url_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()))
}

fn timeout_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    Ok(Option::<u64>::deserialize(d)?.unwrap_or(DEFAULT_TIMEOUT_SECS))
}

impl ScrapeRequest {
    /// Email and password, only when both are non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let email = self.login_email.as_deref().filter(|s| !s.is_empty())?;
        let password = self.login_password.as_deref().filter(|s| !s.is_empty())?;
        Some((email, password))
    }

    /// Where the login form is expected.
    pub fn login_target(&self) -> &str {
        self.login_url
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.base_url)
    }

    /// `timeout: 0` means no bound.
    pub fn navigation_timeout(&self) -> Duration {
        match self.timeout {
            0 => Duration::MAX,
            secs => Duration::from_secs(secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginOutcome {
    /// No credentials supplied.
    NotAttempted,
    /// Password submitted; whether the site accepted it is unknown.
    Submitted,
    /// Form not found or the attempt errored.
    Failed,
}

impl LoginOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginOutcome::NotAttempted => "not_attempted",
            LoginOutcome::Submitted => "submitted",
            LoginOutcome::Failed => "failed",
        }
    }
}

impl fmt::Display for LoginOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralInfo {
    pub profit: Option<String>,
    pub age: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookmakerRow {
    pub bookmaker: Option<String>,
    pub sport: Option<String>,
    pub datetime: Option<String>,
    pub event: Option<String>,
    pub type_pari: Option<String>,
    pub cote: Option<String>,
}

impl BookmakerRow {
    /// A row is kept only when it names a bookmaker or an event.
    pub fn is_identifiable(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.bookmaker) || present(&self.event)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurebetGroup {
    pub general_info: GeneralInfo,
    pub bookmakers: Vec<BookmakerRow>,
}

/// Surebet blocks keyed `surebet_p<n>`, kept in DOM encounter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurebetMap {
    entries: Vec<(String, SurebetGroup)>,
}

impl SurebetMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends, or replaces the group under an existing key in place.
    pub fn insert(&mut self, key: impl Into<String>, group: SurebetGroup) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = group,
            None => self.entries.push((key, group)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&SurebetGroup> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, g)| g)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bookmaker_rows(&self) -> usize {
        self.entries.iter().map(|(_, g)| g.bookmakers.len()).sum()
    }
}

impl Serialize for SurebetMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, group) in &self.entries {
            map.serialize_entry(key, group)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SurebetMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MapVisitor;

        impl<'de> Visitor<'de> for MapVisitor {
            type Value = SurebetMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of surebet groups")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<SurebetMap, A::Error> {
                let mut out = SurebetMap::new();
                while let Some((key, group)) = access.next_entry::<String, SurebetGroup>()? {
                    out.insert(key, group);
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(MapVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeMeta {
    pub started_at: DateTime<Utc>,
    pub login: LoginOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub scraped_at: DateTime<Utc>,
    pub base_url: String,
    pub data: SurebetMap,
    pub meta: ScrapeMeta,
}
