use super::ApiError;
use crate::constants::limits::MIN_SEARCH_QUERY_CHARS;

pub fn validate_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

pub fn require_id(id: Option<i32>) -> Result<i32, ApiError> {
    id.ok_or_else(|| ApiError::validation("Missing id")).and_then(validate_id)
}

pub fn validate_slug(slug: &str) -> Result<&str, ApiError> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(ApiError::validation("Slug cannot be empty"));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ApiError::validation(
            "Slug can only contain lowercase letters, digits and hyphens",
        ));
    }
    Ok(slug)
}

pub fn validate_limit(limit: u64, max: u64) -> Result<u64, ApiError> {
    if !(1..=max).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Invalid limit: {limit}. Limit must be between 1 and {max}"
        )));
    }
    Ok(limit)
}

pub fn validate_days(days: i64) -> Result<i64, ApiError> {
    if !(1..=365).contains(&days) {
        return Err(ApiError::validation(format!(
            "Invalid days: {days}. Days must be between 1 and 365"
        )));
    }
    Ok(days)
}

pub fn validate_search_query(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.chars().count() < MIN_SEARCH_QUERY_CHARS {
        return Err(ApiError::validation(format!(
            "Search query must be at least {MIN_SEARCH_QUERY_CHARS} characters"
        )));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id(1).is_ok());
        assert!(validate_id(0).is_err());
        assert!(validate_id(-4).is_err());
        assert!(require_id(None).is_err());
        assert_eq!(require_id(Some(7)).unwrap(), 7);
    }

    #[test]
    fn test_validate_slug() {
        assert_eq!(validate_slug(" arsenal-vs-chelsea-20260314 ").unwrap(), "arsenal-vs-chelsea-20260314");
        assert!(validate_slug("").is_err());
        assert!(validate_slug("Bad Slug").is_err());
    }

    #[test]
    fn test_validate_limit_and_days() {
        assert!(validate_limit(1, 100).is_ok());
        assert!(validate_limit(100, 100).is_ok());
        assert!(validate_limit(0, 100).is_err());
        assert!(validate_limit(101, 100).is_err());
        assert!(validate_days(7).is_ok());
        assert!(validate_days(0).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  kgf ").unwrap(), "kgf");
        assert!(validate_search_query(" a ").is_err());
        assert!(validate_search_query("").is_err());
    }
}
