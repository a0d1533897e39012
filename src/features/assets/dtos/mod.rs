mod asset_dto;
mod filter_options_dto;

pub use asset_dto::{
    AssetContent, AssetMetadata, AssetResponseDto, Disposition, QuickSearchQuery,
    QuickSearchResponseDto, StorageStatsDto, UpdateAssetDto, Upload, UploadAssetDto,
};
pub use filter_options_dto::{AssetTypeOptionDto, DateRangeDto, FilterOptionsDto};
