mod category;

pub use category::{Category, CategoryKey, CategoryRef};
