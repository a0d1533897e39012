use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating username fields
    /// Must start with letter or underscore and contain only alphanumeric characters and underscores
    /// - Valid: "john_doe", "user123", "_admin", "JohnDoe"
    /// - Invalid: "123user", "-user", "user-name", "user name"
    pub static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();
}

/// Validate a taxonomy name (category or tag).
///
/// Tag names end up in the comma-delimited legacy column, so commas are rejected.
pub fn validate_taxonomy_name(name: &str) -> Result<(), validator::ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    if trimmed.contains(',') {
        return Err(validator::ValidationError::new("contains_comma"));
    }
    Ok(())
}

/// Validate a category name. Integer names would collide with id lookups.
pub fn validate_category_name(name: &str) -> Result<(), validator::ValidationError> {
    validate_taxonomy_name(name)?;
    if name.trim().parse::<i64>().is_ok() {
        return Err(validator::ValidationError::new("numeric_category_name"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_regex_valid() {
        assert!(USERNAME_REGEX.is_match("john_doe"));
        assert!(USERNAME_REGEX.is_match("user123"));
        assert!(USERNAME_REGEX.is_match("_admin"));
        assert!(USERNAME_REGEX.is_match("JohnDoe"));
    }

    #[test]
    fn test_username_regex_invalid() {
        assert!(!USERNAME_REGEX.is_match("123user")); // starts with digit
        assert!(!USERNAME_REGEX.is_match("-user")); // starts with hyphen
        assert!(!USERNAME_REGEX.is_match("user-name")); // hyphen
        assert!(!USERNAME_REGEX.is_match("user name")); // space
        assert!(!USERNAME_REGEX.is_match("")); // empty
    }

    #[test]
    fn test_taxonomy_name() {
        assert!(validate_taxonomy_name("Photos").is_ok());
        assert!(validate_taxonomy_name("   ").is_err());
        assert!(validate_taxonomy_name("a,b").is_err());
        assert!(validate_taxonomy_name("2024").is_ok());
    }

    #[test]
    fn test_category_name_rejects_integers() {
        assert!(validate_category_name("2024 Photos").is_ok());
        assert!(validate_category_name(" 2024 ").is_err());
        assert!(validate_category_name("-3").is_err());
        assert!(validate_category_name("a,b").is_err());
    }
}
