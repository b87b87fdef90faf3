use crate::host::{ChannelStore, PlatformHooks, SettingsStore};
use crate::model::PluginSettings;
use crate::utils::create_http_client;
use log::{debug, warn};
use std::sync::Arc;

/// Everything a request needs, injected once at construction. The plugin
/// holds no other state, requests are independent of each other.
pub struct PluginState {
    pub store: Arc<dyn ChannelStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub hooks: Arc<PlatformHooks>,
    pub http_client: Arc<reqwest::Client>,
}

impl PluginState {
    pub fn new(
        store: Arc<dyn ChannelStore>,
        settings: Arc<dyn SettingsStore>,
        hooks: Arc<PlatformHooks>,
    ) -> Self {
        Self {
            store,
            settings,
            hooks,
            http_client: Arc::new(create_http_client()),
        }
    }

    /// Read fresh on every call so enable/disable takes effect on the next
    /// request. Fail-closed: a storage error counts as disabled.
    pub fn is_enabled(&self) -> bool {
        match self.settings.plugin_enabled() {
            Ok(enabled) => enabled,
            Err(err) => {
                debug!("Failed to read plugin enabled flag, treating as disabled: {err}");
                false
            }
        }
    }

    pub fn plugin_settings(&self) -> PluginSettings {
        self.settings.plugin_settings().unwrap_or_else(|err| {
            warn!("Failed to read plugin settings, using defaults: {err}");
            PluginSettings::default()
        })
    }
}
