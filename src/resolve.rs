use crate::host::ChannelStore;
use crate::model::{Channel, ClientUser, ProviderStream, UNRESTRICTED_USER_LEVEL};
use log::{debug, error};

/// Outcome of identifier resolution. The provider-id branch always yields a
/// stream, the internal-id fallback yields only a channel; callers that need
/// a stream after an internal-id hit must fetch the channel's first stream
/// themselves.
#[derive(Debug, Clone)]
pub enum StreamRef {
    Provider { channel: Channel, stream: ProviderStream },
    Internal { channel: Channel },
}

impl StreamRef {
    pub fn channel(&self) -> &Channel {
        match self {
            Self::Provider { channel, .. } | Self::Internal { channel } => channel,
        }
    }
}

/// Strips the trailing file extension from a raw stream id path segment,
/// e.g. "12345.ts" -> "12345".
pub fn strip_stream_extension(raw: &str) -> &str {
    raw.rsplit_once('.').map_or(raw, |(stem, _)| stem)
}

/// Exact string match among XC-sourced streams, then the stream's first
/// associated channel.
pub fn resolve_by_provider_id(store: &dyn ChannelStore, provider_id: &str) -> Option<(Channel, ProviderStream)> {
    debug!("Searching for provider stream id {provider_id} in XC streams");
    let stream = store.xc_stream_by_provider_id(provider_id)?;
    match store.first_channel_of_stream(stream.id) {
        Some(channel) => {
            debug!("Found channel '{}' for provider stream id {provider_id}", channel.name);
            Some((channel, stream))
        }
        None => {
            error!("Stream found but no channel associated for provider stream id {provider_id}");
            None
        }
    }
}

/// Internal-id lookup with access-control filtering. Users below the
/// unrestricted level are limited by channel level and, when they have
/// channel profiles, by enabled profile membership.
pub fn channel_by_internal_id(store: &dyn ChannelStore, user: &ClientUser, channel_id: u32) -> Option<Channel> {
    if user.user_level >= UNRESTRICTED_USER_LEVEL {
        return store.channel_by_id(channel_id);
    }
    let channel = store.channel_by_id(channel_id)?;
    if channel.user_level > user.user_level {
        return None;
    }
    if store.user_profile_count(&user.username) > 0
        && !store.channel_in_user_profiles(channel_id, &user.username)
    {
        return None;
    }
    Some(channel)
}

/// Maps an externally supplied stream id to a channel: provider-native id
/// first, internal numeric id as fallback. A fallback parse failure ends
/// resolution, there is no further rule.
pub fn resolve_stream_ref(store: &dyn ChannelStore, user: &ClientUser, raw_id: &str) -> Option<StreamRef> {
    if let Some((channel, stream)) = resolve_by_provider_id(store, raw_id) {
        return Some(StreamRef::Provider { channel, stream });
    }
    let internal_id = raw_id.trim().parse::<u32>().ok()?;
    channel_by_internal_id(store, user, internal_id).map(|channel| StreamRef::Internal { channel })
}
