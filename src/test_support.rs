use crate::api::model::PluginState;
use crate::error::SettingsError;
use crate::host::{
    CatalogHook, ChannelStore, LiveServeHook, LiveStreamArgs, PlatformHooks, ResolveHook,
    SettingsStore, UuidServeHook,
};
use crate::model::{
    AccountType, Channel, ClientUser, PluginSettings, ProviderStream, UpstreamAccount,
};
use axum::extract::Request;
use axum::http::header::{CONTENT_RANGE, CONTENT_TYPE, RANGE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures::StreamExt;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

pub fn test_user(username: &str, user_level: i32, xc_password: Option<&str>) -> ClientUser {
    let mut custom_properties = Map::new();
    if let Some(password) = xc_password {
        custom_properties.insert("xc_password".to_string(), Value::from(password));
    }
    ClientUser { username: username.to_string(), user_level, custom_properties }
}

pub fn test_channel(id: u32, name: &str, user_level: i32) -> Channel {
    Channel { id, uuid: Uuid::new_v4(), name: name.to_string(), user_level }
}

pub fn test_stream(id: u32, account_id: u32, props: Value) -> ProviderStream {
    ProviderStream {
        id,
        account_id,
        custom_properties: props.as_object().cloned().unwrap_or_default(),
    }
}

pub fn xc_account(id: u32, server_url: &str) -> UpstreamAccount {
    UpstreamAccount {
        id,
        account_type: AccountType::Xc,
        server_url: server_url.to_string(),
        username: "xcuser".to_string(),
        password: "xcpass".to_string(),
        user_agent: "VLC/3.0.20".to_string(),
    }
}

pub fn live_args(username: &str, password: &str, channel_id: &str) -> LiveStreamArgs {
    LiveStreamArgs {
        username: username.to_string(),
        password: password.to_string(),
        channel_id: channel_id.to_string(),
    }
}

pub struct MemoryStore {
    pub users: Vec<ClientUser>,
    pub channels: Vec<Channel>,
    pub streams: Vec<ProviderStream>,
    pub accounts: Vec<UpstreamAccount>,
    /// stream id -> associated channel ids, store order
    pub stream_channels: HashMap<u32, Vec<u32>>,
    /// channel id -> stream ids ordered by the per-channel ordinal
    pub channel_streams: HashMap<u32, Vec<u32>>,
    /// username -> channel ids visible through the user's profiles
    pub profiles: HashMap<String, Vec<u32>>,
}

/// Fixture data shared by most tests:
/// - XC account 1, M3U account 2
/// - channel 155 "News" (level 0) with XC stream 10, provider id 22371, archive on
/// - channel 300 "NoArchive" (level 0) with XC stream 12 (tv_archive=0) and M3U stream 11
/// - channel 310 "Premium5" (level 5) with XC stream 13, provider id 40000, archive on
/// - user "john" (level 1, xc_password secret123), user "nopass" (no credential)
pub fn memory_store() -> MemoryStore {
    let mut account2 = xc_account(2, "http://m3u.example");
    account2.account_type = AccountType::M3u;
    MemoryStore {
        users: vec![test_user("john", 1, Some("secret123")), test_user("nopass", 1, None)],
        channels: vec![
            test_channel(155, "News", 0),
            test_channel(300, "NoArchive", 0),
            test_channel(310, "Premium5", 5),
        ],
        streams: vec![
            test_stream(10, 1, json!({"stream_id": "22371", "tv_archive": 1, "tv_archive_duration": 5})),
            test_stream(11, 2, json!({"stream_id": "31337", "tv_archive": 1})),
            test_stream(12, 1, json!({"stream_id": "50000", "tv_archive": 0})),
            test_stream(13, 1, json!({"stream_id": "40000", "tv_archive": 1, "tv_archive_duration": 60})),
        ],
        accounts: vec![xc_account(1, "http://provider.example"), account2],
        stream_channels: HashMap::from([
            (10, vec![155]),
            (11, vec![300]),
            (12, vec![300]),
            (13, vec![310]),
        ]),
        channel_streams: HashMap::from([
            (155, vec![10]),
            (300, vec![12, 11]),
            (310, vec![13]),
        ]),
        profiles: HashMap::new(),
    }
}

impl ChannelStore for MemoryStore {
    fn user_by_name(&self, username: &str) -> Option<ClientUser> {
        self.users.iter().find(|user| user.username == username).cloned()
    }

    fn xc_stream_by_provider_id(&self, provider_id: &str) -> Option<ProviderStream> {
        self.streams
            .iter()
            .filter(|stream| {
                self.accounts
                    .iter()
                    .any(|account| account.id == stream.account_id && account.account_type == AccountType::Xc)
            })
            .find(|stream| stream.provider_stream_id().as_deref() == Some(provider_id))
            .cloned()
    }

    fn first_channel_of_stream(&self, stream_id: u32) -> Option<Channel> {
        let channel_id = self.stream_channels.get(&stream_id)?.first()?;
        self.channel_by_id(*channel_id)
    }

    fn channel_by_id(&self, channel_id: u32) -> Option<Channel> {
        self.channels.iter().find(|channel| channel.id == channel_id).cloned()
    }

    fn first_stream_of_channel(&self, channel_id: u32) -> Option<ProviderStream> {
        let stream_id = self.channel_streams.get(&channel_id)?.first()?;
        self.streams.iter().find(|stream| stream.id == *stream_id).cloned()
    }

    fn account_of_stream(&self, stream_id: u32) -> Option<UpstreamAccount> {
        let stream = self.streams.iter().find(|stream| stream.id == stream_id)?;
        self.accounts.iter().find(|account| account.id == stream.account_id).cloned()
    }

    fn user_profile_count(&self, username: &str) -> usize {
        usize::from(self.profiles.contains_key(username))
    }

    fn channel_in_user_profiles(&self, channel_id: u32, username: &str) -> bool {
        self.profiles
            .get(username)
            .is_some_and(|channels| channels.contains(&channel_id))
    }
}

#[derive(Default)]
pub struct TestCounters {
    pub resolve_calls: AtomicUsize,
    pub catalog_calls: AtomicUsize,
    pub live_serve_calls: AtomicUsize,
    pub uuid_serve_calls: AtomicUsize,
    /// When set, settings reads fail so the fail-closed path can be tested.
    pub settings_fail: AtomicBool,
}

struct TestSettings {
    enabled: bool,
    counters: Arc<TestCounters>,
}

impl SettingsStore for TestSettings {
    fn plugin_enabled(&self) -> Result<bool, SettingsError> {
        if self.counters.settings_fail.load(Ordering::SeqCst) {
            return Err(SettingsError::new("storage unavailable".to_string()));
        }
        Ok(self.enabled)
    }

    fn plugin_settings(&self) -> Result<PluginSettings, SettingsError> {
        if self.counters.settings_fail.load(Ordering::SeqCst) {
            return Err(SettingsError::new("storage unavailable".to_string()));
        }
        Ok(PluginSettings { enabled: self.enabled, ..PluginSettings::default() })
    }
}

fn catalog_fixture() -> Vec<Map<String, Value>> {
    [json!({"stream_id": 155, "name": "News"}), json!({"stream_id": 999, "name": "Orphan"})]
        .iter()
        .filter_map(|entry| entry.as_object().cloned())
        .collect()
}

/// Hooks standing in for the host platform: the originals answer with
/// marker bodies and count their invocations.
fn test_hooks(counters: &Arc<TestCounters>) -> PlatformHooks {
    let resolve_counters = Arc::clone(counters);
    let catalog_counters = Arc::clone(counters);
    let live_counters = Arc::clone(counters);
    let uuid_counters = Arc::clone(counters);
    PlatformHooks::new(
        ResolveHook(Box::new(move |_request| {
            resolve_counters.resolve_calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { "host-router".into_response() })
        })),
        CatalogHook(Box::new(move |_user, _category_id| {
            catalog_counters.catalog_calls.fetch_add(1, Ordering::SeqCst);
            catalog_fixture()
        })),
        LiveServeHook(Box::new(move |_request, _args| {
            live_counters.live_serve_calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { "host-live".into_response() })
        })),
        UuidServeHook(Box::new(move |_request, uuid| {
            uuid_counters.uuid_serve_calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { format!("uuid-stream:{uuid}").into_response() })
        })),
    )
}

pub fn plugin_state(store: MemoryStore, enabled: bool) -> (Arc<PluginState>, Arc<TestCounters>) {
    let counters = Arc::new(TestCounters::default());
    let settings = TestSettings { enabled, counters: Arc::clone(&counters) };
    let hooks = test_hooks(&counters);
    let state = PluginState::new(Arc::new(store), Arc::new(settings), Arc::new(hooks));
    (Arc::new(state), counters)
}

pub fn request_for(path: &str) -> Request {
    Request::builder()
        .uri(path)
        .body(axum::body::Body::empty())
        .expect("request")
}

pub async fn response_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

pub enum UpstreamBehavior {
    /// 200 with a short video body.
    Ok,
    /// 404 with a text body, the provider does not know the stream.
    NotFound,
    /// 206 with a Content-Range header, echoes the received Range header
    /// into the body.
    Partial,
    /// Accepts the connection but never answers.
    Stall,
    /// 200 whose body arrives as 12 single-byte chunks, 100ms apart.
    Trickle,
}

pub struct TestUpstream {
    pub base_url: String,
}

/// Loopback stand-in for the XC provider, serving the default catchup path.
pub async fn spawn_upstream(behavior: UpstreamBehavior) -> TestUpstream {
    let app = match behavior {
        UpstreamBehavior::Ok => Router::new().route(
            "/streaming/timeshift.php",
            get(|| async { ([(CONTENT_TYPE, "video/mp2t")], "tsbytes") }),
        ),
        UpstreamBehavior::NotFound => Router::new().route(
            "/streaming/timeshift.php",
            get(|| async { (StatusCode::NOT_FOUND, "stream not found") }),
        ),
        UpstreamBehavior::Partial => Router::new().route(
            "/streaming/timeshift.php",
            get(|headers: HeaderMap| async move {
                let range = headers
                    .get(RANGE)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                (
                    StatusCode::PARTIAL_CONTENT,
                    [(CONTENT_RANGE, "bytes 1000-1006/1007"), (CONTENT_TYPE, "video/mp2t")],
                    range,
                )
            }),
        ),
        UpstreamBehavior::Stall => Router::new().route(
            "/streaming/timeshift.php",
            get(|| async {
                std::future::pending::<()>().await;
                StatusCode::OK
            }),
        ),
        UpstreamBehavior::Trickle => Router::new().route(
            "/streaming/timeshift.php",
            get(|| async {
                let chunks = futures::stream::iter(0..12).then(|_| async {
                    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                    Ok::<_, std::io::Error>(bytes::Bytes::from_static(b"x"))
                });
                (
                    [(CONTENT_TYPE, "video/mp2t")],
                    axum::body::Body::from_stream(chunks),
                )
            }),
        ),
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind upstream");
    let addr = listener.local_addr().expect("upstream addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve upstream");
    });
    TestUpstream { base_url: format!("http://{addr}") }
}
