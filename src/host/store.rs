use crate::error::SettingsError;
use crate::model::{Channel, ClientUser, PluginSettings, ProviderStream, UpstreamAccount};

/// Read-only view on the host platform's relational store. The plugin never
/// owns the lifecycle of these records, it only queries them by simple
/// predicates.
pub trait ChannelStore: Send + Sync {
    fn user_by_name(&self, username: &str) -> Option<ClientUser>;

    /// First store-ordering match among XC-sourced streams whose
    /// provider-native stream id equals `provider_id` exactly. Collisions
    /// across accounts resolve to the first match, a known limitation.
    fn xc_stream_by_provider_id(&self, provider_id: &str) -> Option<ProviderStream>;

    /// First channel associated with the stream, in store ordering.
    fn first_channel_of_stream(&self, stream_id: u32) -> Option<Channel>;

    fn channel_by_id(&self, channel_id: u32) -> Option<Channel>;

    /// First stream of the channel, ordered by the per-channel ordinal.
    fn first_stream_of_channel(&self, channel_id: u32) -> Option<ProviderStream>;

    fn account_of_stream(&self, stream_id: u32) -> Option<UpstreamAccount>;

    fn user_profile_count(&self, username: &str) -> usize;

    /// Whether the channel has an enabled membership in any of the user's
    /// channel profiles.
    fn channel_in_user_profiles(&self, channel_id: u32, username: &str) -> bool;
}

/// Access to the host's plugin settings storage. Callers treat any error
/// from `plugin_enabled` as disabled (fail-closed).
pub trait SettingsStore: Send + Sync {
    fn plugin_enabled(&self) -> Result<bool, SettingsError>;

    fn plugin_settings(&self) -> Result<PluginSettings, SettingsError>;
}
