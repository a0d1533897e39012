mod asset_service;
pub mod filter_options;

pub use asset_service::{format_size, AssetService};
