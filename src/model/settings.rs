use serde::Deserialize;

pub const DEFAULT_TIMEZONE: &str = "Europe/Brussels";

/// XC convention for catchup playback. Placeholders are literal tokens,
/// the set is configuration-defined and extensible without code change.
pub const DEFAULT_CATCHUP_URL_TEMPLATE: &str = "{server.url}/streaming/timeshift.php?username={XC.username}&password={XC.password}&stream={stream_id}&start={program.starttime}&duration={program.duration}";

/// Default program duration in minutes substituted for `{program.duration}`.
pub const DEFAULT_CATCHUP_DURATION: &str = "120";

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_catchup_url_template() -> String {
    DEFAULT_CATCHUP_URL_TEMPLATE.to_string()
}

/// Plugin settings, owned and persisted by the host. Read fresh per request
/// so enable/disable takes effect without a restart.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginSettings {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_catchup_url_template")]
    pub catchup_url_template: String,
    #[serde(default)]
    pub enabled: bool,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            catchup_url_template: default_catchup_url_template(),
            enabled: false,
        }
    }
}
