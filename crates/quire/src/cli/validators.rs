//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute to validate
//! user input at parse time, providing immediate feedback for invalid values.

/// Maximum title length in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Validate an issue identifier: a display name or an id prefix.
pub fn validate_issue_ident(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Issue name or id cannot be empty".to_string());
    }

    if s.chars().any(char::is_whitespace) {
        return Err(format!(
            "Invalid issue name or id: '{s}'. Expected e.g. core-1 or an id prefix"
        ));
    }

    Ok(s.to_string())
}

/// Validate a component or release name.
///
/// Names may contain spaces but not surrounding whitespace or newlines.
pub fn validate_name(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Name cannot be empty".to_string());
    }

    if s.contains('\n') || s.contains('\r') {
        return Err("Name cannot contain newline characters".to_string());
    }

    Ok(s.to_string())
}

/// Validate title length.
///
/// Title must not exceed [`MAX_TITLE_LENGTH`] characters.
pub fn validate_title(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Title cannot be empty".to_string());
    }

    let length = s.chars().count();
    if length > MAX_TITLE_LENGTH {
        return Err(format!(
            "Title cannot exceed {MAX_TITLE_LENGTH} characters, got {length} characters"
        ));
    }

    if s.contains('\n') || s.contains('\r') {
        return Err("Title cannot contain newline characters".to_string());
    }

    if let Some(pos) = s.chars().position(|c| {
        let code = c as u32;
        (code < 0x20 && code != 0x09) || (0x7F..=0x9F).contains(&code)
    }) {
        return Err(format!(
            "Title contains invalid control character at position {pos}"
        ));
    }

    Ok(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // ========== Issue Identifier Validation ==========

    #[rstest]
    #[case::name("core-1")]
    #[case::prefix("abc")]
    #[case::full_id("0123456789abcdef0123456789abcdef01234567")]
    fn test_validate_issue_ident_valid(#[case] ident: &str) {
        assert_eq!(validate_issue_ident(ident).unwrap(), ident);
    }

    #[test]
    fn test_validate_issue_ident_trims() {
        assert_eq!(validate_issue_ident("  core-1 ").unwrap(), "core-1");
    }

    #[rstest]
    #[case::empty("", "cannot be empty")]
    #[case::blank("   ", "cannot be empty")]
    #[case::space("core 1", "Invalid issue name")]
    fn test_validate_issue_ident_invalid(#[case] ident: &str, #[case] expected: &str) {
        assert!(validate_issue_ident(ident).unwrap_err().contains(expected));
    }

    // ========== Name Validation ==========

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name(" web ui ").unwrap(), "web ui");
        assert!(validate_name("").is_err());
        assert!(validate_name("a\nb").unwrap_err().contains("newline"));
    }

    // ========== Title Validation ==========

    #[test]
    fn test_validate_title_valid() {
        assert!(validate_title("Short title").is_ok());
        assert!(validate_title("A".repeat(200).as_str()).is_ok());
    }

    #[test]
    fn test_validate_title_too_long() {
        let result = validate_title("A".repeat(201).as_str());
        assert!(result.unwrap_err().contains("cannot exceed 200"));
    }

    #[test]
    fn test_validate_title_rejects_control_characters() {
        let result = validate_title("bad\u{7}title");
        assert!(result.unwrap_err().contains("control character at position 3"));
    }
}
