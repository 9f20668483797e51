use crate::error::*;
use serde::Deserialize;
use std::fmt::Display;
use std::fmt::Formatter;
use std::path::Path;

/// Parsed settings document. Loaded once at startup and passed by
/// reference to the resolver, the notifier and the plan builder.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub telegram: Vec<ChannelProfile>,
    #[serde(default)]
    pub sql_db: Vec<ProfileEntry>,
    #[serde(default)]
    pub notify: NotifySettings,
    #[serde(default)]
    pub jobs: Option<Vec<JobEntry>>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ReplicationError::configuration(format!("reading {}: {}", path.display(), e))
        })?;
        Self::parse(&text)
            .map_err(|e| ReplicationError::configuration(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| ReplicationError::configuration(e.to_string()))
    }
}

/// One messaging endpoint.
#[derive(Clone, Deserialize)]
pub struct ChannelProfile {
    #[serde(deserialize_with = "scalar")]
    pub bot_token: String,
    #[serde(deserialize_with = "scalar")]
    pub channel_id: String,
}

impl std::fmt::Debug for ChannelProfile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelProfile")
            .field("bot_token", &"***")
            .field("channel_id", &self.channel_id)
            .finish()
    }
}

/// A connection profile as written in the settings file.
///
/// Fields stay loose until [`ProfileEntry::profile`] validates them, so a
/// broken entry only fails the jobs that actually use it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileEntry {
    pub host: Option<serde_yaml::Value>,
    pub user: Option<serde_yaml::Value>,
    pub password: Option<serde_yaml::Value>,
    pub port: Option<serde_yaml::Value>,
    pub database: Option<serde_yaml::Value>,
}

impl ProfileEntry {
    pub fn profile(&self) -> Result<ConnectionProfile> {
        let host = text("host", &self.host)?;
        let user = text("user", &self.user)?;
        let password = text("password", &self.password)?;
        let database = text("database", &self.database)?;
        let port = match &self.port {
            None => return Err(ReplicationError::configuration("port is missing")),
            Some(serde_yaml::Value::Number(n)) => n.as_u64(),
            Some(serde_yaml::Value::String(s)) => s.trim().parse::<u64>().ok(),
            Some(_) => None,
        }
        .and_then(|p| u16::try_from(p).ok())
        .filter(|p| *p != 0)
        .ok_or_else(|| ReplicationError::configuration(format!("malformed port {:?}", self.port)))?;
        Ok(ConnectionProfile {
            host,
            user,
            password,
            port,
            database,
        })
    }
}

fn text(field: &str, value: &Option<serde_yaml::Value>) -> Result<String> {
    match value {
        Some(serde_yaml::Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(serde_yaml::Value::Number(n)) => Ok(n.to_string()),
        Some(serde_yaml::Value::String(_)) | Some(serde_yaml::Value::Null) | None => Err(
            ReplicationError::configuration(format!("{} is missing", field)),
        ),
        Some(other) => Err(ReplicationError::configuration(format!(
            "{} is malformed: {:?}",
            field, other
        ))),
    }
}

/// Accepts strings or bare numbers, since channel ids are usually written unquoted.
fn scalar<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, found {:?}",
            other
        ))),
    }
}

/// A validated, immutable database address.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    pub host: String,
    pub user: String,
    pub password: String,
    pub port: u16,
    pub database: String,
}

/// Renders as a connection URL with the password redacted.
impl Display for ConnectionProfile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "postgres://{}:***@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

impl std::fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// Notification routing and delivery policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifySettings {
    /// Channel index for per-stage progress messages.
    pub progress: usize,
    /// Channel index for the end-of-run summary.
    pub summary: usize,
    pub api: String,
    pub timeout_secs: u64,
    pub retries: u32,
    pub backoff_secs: f64,
    pub verify_tls: bool,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            progress: 1,
            summary: 0,
            api: String::from("https://api.telegram.org"),
            timeout_secs: 10,
            retries: 3,
            backoff_secs: 1.0,
            verify_tls: false,
        }
    }
}

/// A job as written in the settings file. Exactly one of `dataset` and
/// `columns` names the projection.
#[derive(Debug, Clone, Deserialize)]
pub struct JobEntry {
    pub name: String,
    pub table: String,
    pub target: Option<String>,
    pub dataset: Option<String>,
    pub columns: Option<Vec<String>>,
    pub window_column: String,
    pub source: usize,
    pub destination: usize,
    pub retention: Option<RetentionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetentionEntry {
    pub table: Option<String>,
    pub column: String,
    pub days: u64,
}
