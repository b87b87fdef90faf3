//! Timeshift interception plugin for XC-style IPTV platforms.
//!
//! IPTV clients request catchup playback with URLs the host platform cannot
//! route: the provider's stream id sits where the platform expects its own
//! id, and the real stream id travels in the segment named "duration". This
//! crate installs an interception layer ahead of the host's routing that
//! recognizes those URLs, maps the provider id back to a platform channel,
//! authenticates against the side-channel IPTV credential and proxies the
//! provider's catchup stream with Range support.
//!
//! The host platform stays untouched: it exposes its extension points as
//! [`host::PlatformHooks`] slots and read-only [`host::ChannelStore`] /
//! [`host::SettingsStore`] implementations, and the
//! [`TimeshiftInterceptor`] swaps the slots on `install` and restores them
//! on `uninstall`.

pub mod api;
pub mod error;
pub mod host;
pub mod model;
pub mod resolve;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::intercept::TimeshiftInterceptor;
pub use api::model::PluginState;
pub use api::timeshift_api::{timeshift_proxy, TimeshiftArgs};
pub use error::{TimeshiftError, TimeshiftErrorKind};
