mod asset;

pub use asset::{Asset, AssetChanges, AssetTotals, AssetType, NewAsset};
