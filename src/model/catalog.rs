use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Users at or above this level bypass channel profile filtering.
pub const UNRESTRICTED_USER_LEVEL: i32 = 10;

pub const PROP_STREAM_ID: &str = "stream_id";
pub const PROP_TV_ARCHIVE: &str = "tv_archive";
pub const PROP_TV_ARCHIVE_DURATION: &str = "tv_archive_duration";
pub const PROP_XC_PASSWORD: &str = "xc_password";

/// A channel as the host platform stores it. The plugin never mutates
/// channels, it only reads them through `ChannelStore`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: u32,
    pub uuid: Uuid,
    pub name: String,
    pub user_level: i32,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccountType {
    #[serde(rename = "XC")]
    Xc,
    #[serde(rename = "M3U")]
    M3u,
}

/// Upstream provider account a stream was sourced from. Immutable for the
/// duration of a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamAccount {
    pub id: u32,
    pub account_type: AccountType,
    pub server_url: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

/// A source stream attached to a channel. XC-sourced streams carry the
/// provider's own stream id and the `tv_archive` flags in their property bag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderStream {
    pub id: u32,
    pub account_id: u32,
    #[serde(default)]
    pub custom_properties: Map<String, Value>,
}

impl ProviderStream {
    /// The provider-native stream id, distinct from the platform's internal
    /// channel id. Accepts both JSON string and number representations.
    pub fn provider_stream_id(&self) -> Option<String> {
        property_as_string(&self.custom_properties, PROP_STREAM_ID)
    }

    /// Catchup support predicate used by both the catalog decoration and the
    /// timeshift handler: a non-zero `tv_archive` flag or a non-zero archive
    /// duration means the provider keeps an archive for this stream.
    pub fn catchup_info(&self) -> (bool, i64) {
        let archive = property_as_int(&self.custom_properties, PROP_TV_ARCHIVE);
        let duration = property_as_int(&self.custom_properties, PROP_TV_ARCHIVE_DURATION);
        (archive != 0 || duration > 0, duration)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientUser {
    pub username: String,
    pub user_level: i32,
    #[serde(default)]
    pub custom_properties: Map<String, Value>,
}

impl ClientUser {
    /// The side-channel IPTV credential, not the platform login password.
    pub fn xc_password(&self) -> Option<&str> {
        self.custom_properties
            .get(PROP_XC_PASSWORD)
            .and_then(Value::as_str)
            .filter(|pwd| !pwd.is_empty())
    }
}

pub fn property_as_string(props: &Map<String, Value>, key: &str) -> Option<String> {
    match props.get(key)? {
        Value::String(value) if !value.is_empty() => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

/// Malformed or absent values read as 0, catalog entries should never fail
/// on a single bad property.
pub fn property_as_int(props: &Map<String, Value>, key: &str) -> i64 {
    match props.get(key) {
        Some(Value::Number(value)) => value.as_i64().unwrap_or(0),
        Some(Value::String(value)) => value.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    }
}
