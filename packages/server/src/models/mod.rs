pub mod auth;
pub mod banner;
pub mod shared;
