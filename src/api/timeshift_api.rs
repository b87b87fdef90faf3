use crate::api::model::PluginState;
use crate::error::TimeshiftError;
use crate::host::ChannelStore;
use crate::model::{AccountType, ClientUser, ProviderStream, UpstreamAccount, DEFAULT_CATCHUP_DURATION};
use crate::resolve;
use crate::utils::{convert_timestamp_to_zone, proxy_catchup_stream};
use crate::{bad_request_err, forbidden_err, not_found_err, unauthorized_err};
use axum::http::header::RANGE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use log::{info, warn};
use std::sync::Arc;

/// Captured groups of the timeshift path pattern. The segment names mirror
/// the client's URL construction, which is misleading on purpose: the
/// `duration` segment carries the provider-native stream id and `stream_id`
/// carries the EPG channel number, which is never used for lookup. This is
/// how the client builds timeshift URLs, not a bug to fix here.
#[derive(Debug, Clone)]
pub struct TimeshiftArgs {
    pub username: String,
    pub password: String,
    pub stream_id: String,
    pub timestamp: String,
    pub duration: String,
}

/// Looks up the user and checks the side-channel credential. The platform's
/// primary authentication is never touched. All credential failures map to
/// the same response.
pub(crate) fn authenticate(
    store: &dyn ChannelStore,
    username: &str,
    password: &str,
) -> Result<ClientUser, TimeshiftError> {
    let Some(user) = store.user_by_name(username) else {
        warn!("Auth failed: user '{username}' does not exist");
        return Err(unauthorized_err!("Invalid credentials"));
    };
    match user.xc_password() {
        None => {
            warn!("Auth failed: user '{username}' has no xc_password configured");
            Err(unauthorized_err!("Invalid credentials"))
        }
        Some(xc_password) if xc_password != password => {
            warn!("Auth failed: wrong password for user '{username}'");
            Err(unauthorized_err!("Invalid credentials"))
        }
        Some(_) => Ok(user),
    }
}

fn build_catchup_url(
    template: &str,
    account: &UpstreamAccount,
    stream: &ProviderStream,
    start_time: &str,
) -> String {
    let stream_id = stream.provider_stream_id().unwrap_or_default();
    let placeholders = [
        ("{server.url}", account.server_url.trim_end_matches('/').to_string()),
        ("{XC.username}", account.username.clone()),
        ("{XC.password}", account.password.clone()),
        ("{stream_id}", stream_id),
        ("{program.starttime}", start_time.to_string()),
        ("{program.duration}", DEFAULT_CATCHUP_DURATION.to_string()),
    ];
    let mut url = template.to_string();
    for (token, value) in placeholders {
        url = url.replace(token, &value);
    }
    url
}

/// Serves a timeshift request: authenticate, resolve by provider id,
/// authorize, check catchup support and provider type, convert the
/// timestamp, build the catchup URL and proxy the provider's response.
pub async fn timeshift_proxy(
    state: &Arc<PluginState>,
    req_headers: &HeaderMap,
    args: TimeshiftArgs,
) -> Response {
    match handle_timeshift(state, req_headers, &args).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn handle_timeshift(
    state: &Arc<PluginState>,
    req_headers: &HeaderMap,
    args: &TimeshiftArgs,
) -> Result<Response, TimeshiftError> {
    // the segment named "duration" carries the provider stream id
    let provider_stream_id = args.duration.trim_end_matches(".ts");
    info!(
        "Timeshift request: user={}, provider_stream_id={provider_stream_id}, timestamp={}, url_stream_id={}",
        args.username, args.timestamp, args.stream_id
    );

    let store = state.store.as_ref();
    let user = authenticate(store, &args.username, &args.password)?;

    // provider id is mandatory here, there is no internal-id fallback
    let Some((channel, stream)) = resolve::resolve_by_provider_id(store, provider_stream_id) else {
        warn!(
            "Channel not found for provider stream id {provider_stream_id}. \
             Check: is the stream synced and the account of type XC?"
        );
        return Err(not_found_err!("Channel not found"));
    };

    if user.user_level < channel.user_level {
        warn!("Access denied for user {} to channel {}", args.username, channel.name);
        return Err(forbidden_err!("Access denied"));
    }

    let (has_catchup, _) = stream.catchup_info();
    if !has_catchup {
        return Err(bad_request_err!("Catchup/timeshift not supported for this channel"));
    }

    let account = store
        .account_of_stream(stream.id)
        .filter(|account| account.account_type == AccountType::Xc)
        .ok_or_else(|| bad_request_err!("Channel not from Xtream Codes provider"))?;

    let settings = state.plugin_settings();
    let local_timestamp = convert_timestamp_to_zone(&args.timestamp, &settings.timezone);
    info!(
        "Converted timestamp: {} (UTC) -> {local_timestamp} ({})",
        args.timestamp, settings.timezone
    );

    let catchup_url = build_catchup_url(&settings.catchup_url_template, &account, &stream, &local_timestamp);
    info!("Proxying timeshift for channel: {}", channel.name);

    let range = req_headers.get(RANGE);
    proxy_catchup_stream(&state.http_client, &catchup_url, &account.user_agent, range).await
}
