mod hooks;
mod store;

pub use hooks::*;
pub use store::*;
