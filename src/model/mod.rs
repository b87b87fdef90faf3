mod catalog;
mod settings;

pub use catalog::*;
pub use settings::*;
