pub mod asset;
pub mod goal;
pub mod portfolio;
pub mod trade;
pub mod user_settings;
