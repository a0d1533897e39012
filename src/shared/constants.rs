/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// SEARCH CONSTANTS
// =============================================================================

/// Minimum trimmed length of a quick search query
pub const QUICK_SEARCH_MIN_LENGTH: usize = 2;

/// Maximum number of quick search results
pub const QUICK_SEARCH_LIMIT: i64 = 10;

/// Category filter value that disables the category constraint
pub const CATEGORY_ALL: &str = "all";
