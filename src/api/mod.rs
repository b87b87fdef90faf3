pub mod intercept;
pub mod model;
pub mod timeshift_api;
