use crate::model::ClientUser;
use arc_swap::ArcSwap;
use axum::extract::Request;
use axum::response::Response;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

pub type BoxedResponseFuture = BoxFuture<'static, Response>;

/// Raw path segments of a live stream request as captured by the host
/// router. `channel_id` still carries the file extension.
#[derive(Debug, Clone)]
pub struct LiveStreamArgs {
    pub username: String,
    pub password: String,
    pub channel_id: String,
}

/// The host's path-resolution entry point, consulted for every inbound
/// request before any route pattern matching.
pub struct ResolveHook(pub Box<dyn Fn(Request) -> BoxedResponseFuture + Send + Sync>);

/// The host's "list live streams" catalog function. Returns one mapping
/// object per catalog entry, each with at least a `stream_id` field.
pub struct CatalogHook(pub Box<dyn Fn(&ClientUser, Option<&str>) -> Vec<Map<String, Value>> + Send + Sync>);

/// The host's "serve live stream by raw id segment" function.
pub struct LiveServeHook(pub Box<dyn Fn(Request, LiveStreamArgs) -> BoxedResponseFuture + Send + Sync>);

/// The host's UUID-keyed live playback function. Called, never swapped.
pub struct UuidServeHook(pub Box<dyn Fn(Request, Uuid) -> BoxedResponseFuture + Send + Sync>);

/// Registry of the host's swappable extension slots. The host owns the
/// registry and dispatches through it, the interceptor swaps slots and keeps
/// the originals for restore.
pub struct PlatformHooks {
    pub resolve: ArcSwap<ResolveHook>,
    pub live_catalog: ArcSwap<CatalogHook>,
    pub live_serve: ArcSwap<LiveServeHook>,
    pub serve_by_uuid: Arc<UuidServeHook>,
}

impl PlatformHooks {
    pub fn new(
        resolve: ResolveHook,
        live_catalog: CatalogHook,
        live_serve: LiveServeHook,
        serve_by_uuid: UuidServeHook,
    ) -> Self {
        Self {
            resolve: ArcSwap::from_pointee(resolve),
            live_catalog: ArcSwap::from_pointee(live_catalog),
            live_serve: ArcSwap::from_pointee(live_serve),
            serve_by_uuid: Arc::new(serve_by_uuid),
        }
    }

    /// Resolve and serve an inbound request through the current resolve slot.
    pub async fn dispatch(&self, request: Request) -> Response {
        let hook = self.resolve.load_full();
        (hook.0)(request).await
    }

    pub fn list_live_streams(&self, user: &ClientUser, category_id: Option<&str>) -> Vec<Map<String, Value>> {
        let hook = self.live_catalog.load_full();
        (hook.0)(user, category_id)
    }

    pub async fn serve_live(&self, request: Request, args: LiveStreamArgs) -> Response {
        let hook = self.live_serve.load_full();
        (hook.0)(request, args).await
    }
}
