use crate::api::model::PluginState;
use crate::api::timeshift_api::{authenticate, timeshift_proxy, TimeshiftArgs};
use crate::error::TimeshiftError;
use crate::host::{CatalogHook, ChannelStore, LiveServeHook, LiveStreamArgs, PlatformHooks, ResolveHook};
use crate::model::{property_as_int, PROP_TV_ARCHIVE, PROP_TV_ARCHIVE_DURATION};
use crate::resolve::{self, strip_stream_extension, StreamRef};
use crate::{bad_request_err, forbidden_err, not_found_err};
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use log::{debug, error, info, warn};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::{Arc, LazyLock, Mutex};

/// Anchored shape of the client's timeshift URLs. The timestamp token allows
/// digits, hyphens and colons only.
static TIMESHIFT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^/?timeshift/(?P<username>[^/]+)/(?P<password>[^/]+)/(?P<stream_id>\d+)/(?P<timestamp>[\d\-:]+)/(?P<duration>\d+)\.ts$",
    )
    .expect("timeshift pattern")
});

fn parse_timeshift_path(path: &str) -> Option<TimeshiftArgs> {
    let caps = TIMESHIFT_PATTERN.captures(path)?;
    Some(TimeshiftArgs {
        username: caps["username"].to_string(),
        password: caps["password"].to_string(),
        stream_id: caps["stream_id"].to_string(),
        timestamp: caps["timestamp"].to_string(),
        duration: caps["duration"].to_string(),
    })
}

#[derive(Default)]
struct SavedHooks {
    resolve: Option<Arc<ResolveHook>>,
    live_catalog: Option<Arc<CatalogHook>>,
    live_serve: Option<Arc<LiveServeHook>>,
}

/// Owns the interception lifecycle: `install` swaps the host's hook slots
/// for wrappers and keeps the originals, `uninstall` restores them. All
/// wrappers consult the enabled flag per invocation, so toggling the plugin
/// needs no reinstall.
pub struct TimeshiftInterceptor {
    state: Arc<PluginState>,
    saved: Mutex<SavedHooks>,
}

impl TimeshiftInterceptor {
    pub fn new(state: Arc<PluginState>) -> Self {
        Self {
            state,
            saved: Mutex::new(SavedHooks::default()),
        }
    }

    /// Installs all wrappers. Idempotent: a second call reports success
    /// without re-wrapping. Returns `false` when the interceptor state is
    /// unusable, the caller decides whether plugin activation failed.
    pub fn install(&self) -> bool {
        let Ok(mut saved) = self.saved.lock() else {
            error!("Failed to lock interceptor state for install");
            return false;
        };
        if saved.resolve.is_some() {
            info!("Timeshift hooks already installed");
            return true;
        }
        info!("Installing timeshift hooks...");
        saved.resolve = Some(self.swap_resolve());
        saved.live_catalog = Some(self.swap_live_catalog());
        saved.live_serve = Some(self.swap_live_serve());
        info!("All timeshift hooks installed");
        true
    }

    /// Restores all saved originals. Safe to call when never installed.
    pub fn uninstall(&self) {
        let Ok(mut saved) = self.saved.lock() else {
            error!("Failed to lock interceptor state for uninstall");
            return;
        };
        let hooks = &self.state.hooks;
        if let Some(original) = saved.resolve.take() {
            hooks.resolve.store(original);
            info!("Restored path resolution hook");
        }
        if let Some(original) = saved.live_catalog.take() {
            hooks.live_catalog.store(original);
            info!("Restored live catalog hook");
        }
        if let Some(original) = saved.live_serve.take() {
            hooks.live_serve.store(original);
            info!("Restored live serve hook");
        }
    }

    /// Wraps the host's path resolution so timeshift paths are served before
    /// any route matching. Everything else falls through unchanged.
    fn swap_resolve(&self) -> Arc<ResolveHook> {
        let original = self.state.hooks.resolve.load_full();
        let state = Arc::clone(&self.state);
        let inner = Arc::clone(&original);
        let wrapped = ResolveHook(Box::new(move |request: Request| {
            let state = Arc::clone(&state);
            let inner = Arc::clone(&inner);
            Box::pin(async move {
                let path = request.uri().path();
                if state.is_enabled()
                    && (path.starts_with("/timeshift/") || path.starts_with("timeshift/"))
                {
                    if let Some(args) = parse_timeshift_path(path) {
                        debug!("Intercepted timeshift path: {path}");
                        let headers = request.headers().clone();
                        return timeshift_proxy(&state, &headers, args).await;
                    }
                }
                (inner.0)(request).await
            })
        }));
        self.state.hooks.resolve.store(Arc::new(wrapped));
        original
    }

    /// Wraps the host's catalog listing to add the `tv_archive` fields and
    /// swap `stream_id` for the provider's id, so the client constructs
    /// timeshift URLs the provider-id lookup can resolve.
    fn swap_live_catalog(&self) -> Arc<CatalogHook> {
        let original = self.state.hooks.live_catalog.load_full();
        let state = Arc::clone(&self.state);
        let inner = Arc::clone(&original);
        let wrapped = CatalogHook(Box::new(move |user, category_id| {
            let mut entries = (inner.0)(user, category_id);
            if !state.is_enabled() {
                return entries;
            }
            for entry in &mut entries {
                if let Err(err) = decorate_catalog_entry(state.store.as_ref(), entry) {
                    debug!("Skipped catalog entry decoration: {err}");
                }
            }
            entries
        }));
        self.state.hooks.live_catalog.store(Arc::new(wrapped));
        original
    }

    /// Wraps the host's live serving so provider ids handed out by the
    /// decorated catalog still play: provider-id lookup first, the host's
    /// internal-id logic as fallback.
    fn swap_live_serve(&self) -> Arc<LiveServeHook> {
        let original = self.state.hooks.live_serve.load_full();
        let state = Arc::clone(&self.state);
        let inner = Arc::clone(&original);
        let wrapped = LiveServeHook(Box::new(move |request: Request, args: LiveStreamArgs| {
            let state = Arc::clone(&state);
            let inner = Arc::clone(&inner);
            Box::pin(async move {
                if state.is_enabled() {
                    serve_live_stream(&state, request, &args).await
                } else {
                    (inner.0)(request, args).await
                }
            })
        }));
        self.state.hooks.live_serve.store(Arc::new(wrapped));
        original
    }
}

fn entry_internal_id(entry: &Map<String, Value>) -> Option<u32> {
    match entry.get("stream_id")? {
        Value::Number(value) => value.as_u64().and_then(|id| u32::try_from(id).ok()),
        Value::String(value) => value.trim().parse::<u32>().ok(),
        _ => None,
    }
}

/// Decorates one catalog entry. All values are computed before the entry is
/// touched, a failing entry stays unmodified.
fn decorate_catalog_entry(store: &dyn ChannelStore, entry: &mut Map<String, Value>) -> Result<(), TimeshiftError> {
    let internal_id = entry_internal_id(entry)
        .ok_or_else(|| bad_request_err!("catalog entry without usable stream_id"))?;
    let Some(channel) = store.channel_by_id(internal_id) else {
        return Err(not_found_err!("no channel for internal id {internal_id}"));
    };
    let Some(stream) = store.first_stream_of_channel(channel.id) else {
        // channel without streams, nothing to decorate
        return Ok(());
    };

    let archive = property_as_int(&stream.custom_properties, PROP_TV_ARCHIVE);
    let duration = property_as_int(&stream.custom_properties, PROP_TV_ARCHIVE_DURATION);
    let provider_id = stream
        .provider_stream_id()
        .and_then(|id| id.trim().parse::<i64>().ok());

    entry.insert(PROP_TV_ARCHIVE.to_string(), Value::from(archive));
    entry.insert(PROP_TV_ARCHIVE_DURATION.to_string(), Value::from(duration));
    if let Some(provider_id) = provider_id {
        entry.insert("stream_id".to_string(), Value::from(provider_id));
    }
    Ok(())
}

/// Live playback with provider-id awareness. Authenticates against the
/// side-channel credential, resolves provider id first with internal-id
/// fallback and serves the channel through the host's UUID-keyed function.
async fn serve_live_stream(state: &Arc<PluginState>, request: Request, args: &LiveStreamArgs) -> Response {
    let store = state.store.as_ref();
    let user = match authenticate(store, &args.username, &args.password) {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    let channel_ref = strip_stream_extension(&args.channel_id);
    let channel = match resolve::resolve_stream_ref(store, &user, channel_ref) {
        Some(StreamRef::Provider { channel, .. }) => {
            info!("Live: found channel by provider stream id {channel_ref}: {}", channel.name);
            channel
        }
        Some(StreamRef::Internal { channel }) => channel,
        None => {
            warn!("Live: channel not found for id {channel_ref}");
            return not_found_err!("Not found").into_response();
        }
    };

    if user.user_level < channel.user_level {
        warn!("Live: access denied for user {} to channel {}", args.username, channel.name);
        return forbidden_err!("Access denied").into_response();
    }

    (state.hooks.serve_by_uuid.0)(request, channel.uuid).await
}
