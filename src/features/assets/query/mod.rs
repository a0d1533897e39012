//! Search and filter construction for the asset catalog.

mod builder;
mod filter;
mod params;
mod tag_source;

#[cfg(test)]
pub(crate) mod test_support;

pub use builder::QueryBuilder;
pub use filter::{AssetFilter, AssetQuery, Condition};
pub use params::SearchParams;
pub use tag_source::{
    normalize_names, tag_source_for, DelimitedTags, LinkedTags, TagSemantics, TagSource,
    TagStorage,
};
