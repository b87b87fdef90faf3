mod logging;
mod request;
mod time;

pub use logging::*;
pub use request::*;
pub use time::*;
