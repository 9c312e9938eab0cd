use std::collections::HashSet;

use crate::error::AppError;

/// Parse a comma-separated id list as supplied in the `tag_ids` query
/// parameter (e.g. `"3,1,2"`).
pub fn parse_id_list(raw: &str) -> Result<Vec<i32>, AppError> {
    if raw.trim().is_empty() {
        return Err(AppError::Validation("tag_ids must not be empty".into()));
    }

    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<i32>()
                .map_err(|_| AppError::Validation(format!("Invalid tag id '{}'", part.trim())))
        })
        .collect()
}

/// Validate an id list for write requests: non-empty, positive, no
/// duplicates.
pub fn validate_id_list(ids: &[i32], name: &str) -> Result<(), AppError> {
    if ids.is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }
    let mut seen = HashSet::new();
    for &id in ids {
        if id < 1 {
            return Err(AppError::Validation(format!("{name} must be positive")));
        }
        if !seen.insert(id) {
            return Err(AppError::Validation(format!("Duplicate {name} {id}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_ids() {
        assert_eq!(parse_id_list("3,1,2").unwrap(), vec![3, 1, 2]);
        assert_eq!(parse_id_list(" 1 , 2 ").unwrap(), vec![1, 2]);
    }

    #[test]
    fn rejects_empty_and_malformed_lists() {
        assert!(parse_id_list("").is_err());
        assert!(parse_id_list("   ").is_err());
        assert!(parse_id_list("1,x").is_err());
        assert!(parse_id_list("1,,2").is_err());
    }

    #[test]
    fn id_list_validation() {
        assert!(validate_id_list(&[1, 2], "tag_id").is_ok());
        assert!(validate_id_list(&[], "tag_id").is_err());
        assert!(validate_id_list(&[0], "tag_id").is_err());
        assert!(validate_id_list(&[1, 1], "tag_id").is_err());
    }
}
