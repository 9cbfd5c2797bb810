use super::ApiError;
use crate::constants::limits::MAX_PAGE_SIZE;
use crate::domain::{AnimeId, Weekday};

pub fn validate_anime_id(id: i32) -> Result<AnimeId, ApiError> {
    let anime_id = AnimeId::new(id);
    if !anime_id.is_valid() {
        return Err(ApiError::validation(format!(
            "Invalid anime ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(anime_id)
}

pub fn validate_limit(limit: Option<u32>, default: u32) -> Result<u32, ApiError> {
    let limit = limit.unwrap_or(default);
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Invalid limit: {limit}. Limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok(limit)
}

pub fn validate_page(page: Option<u32>) -> Result<u32, ApiError> {
    match page {
        Some(0) => Err(ApiError::validation("Page numbers start at 1")),
        Some(page) => Ok(page),
        None => Ok(1),
    }
}

pub fn validate_weekday(day: &str) -> Result<Weekday, ApiError> {
    day.parse().map_err(ApiError::validation)
}

pub fn validate_search_query(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Search query cannot be empty"));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_anime_id() {
        assert!(validate_anime_id(1).is_ok());
        assert!(validate_anime_id(12345).is_ok());
        assert!(validate_anime_id(0).is_err());
        assert!(validate_anime_id(-1).is_err());
    }

    #[test]
    fn test_validate_limit() {
        assert_eq!(validate_limit(None, 10).unwrap(), 10);
        assert_eq!(validate_limit(Some(25), 10).unwrap(), 25);
        assert!(validate_limit(Some(0), 10).is_err());
        assert!(validate_limit(Some(26), 10).is_err());
    }

    #[test]
    fn test_validate_page() {
        assert_eq!(validate_page(None).unwrap(), 1);
        assert_eq!(validate_page(Some(3)).unwrap(), 3);
        assert!(validate_page(Some(0)).is_err());
    }

    #[test]
    fn test_validate_weekday() {
        assert_eq!(validate_weekday("Friday").unwrap(), Weekday::Friday);
        assert!(validate_weekday("funday").is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  frieren ").unwrap(), "frieren");
        assert!(validate_search_query("   ").is_err());
    }
}
