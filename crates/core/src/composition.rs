//! Validation rules for parts and composition edits.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of a part code.
pub const MAX_PART_CODE_LENGTH: usize = 3;

/// Maximum length of a part name.
pub const MAX_PART_NAME_LENGTH: usize = 255;

/// Smallest quantity a non-root node may carry.
pub const MIN_QUANTITY: i32 = 1;

/// Sort key given to a new product root and to the first child of a node.
pub const FIRST_SORT_KEY: i32 = 1;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a part code: non-empty, no surrounding whitespace, at most
/// [`MAX_PART_CODE_LENGTH`] characters.
pub fn validate_part_code(code: &str) -> Result<(), CoreError> {
    if code.trim().is_empty() {
        return Err(CoreError::Validation(
            "Part code must not be empty".to_string(),
        ));
    }
    if code.trim().len() != code.len() {
        return Err(CoreError::Validation(
            "Part code must not have leading or trailing whitespace".to_string(),
        ));
    }
    let len = code.chars().count();
    if len > MAX_PART_CODE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Part code must not exceed {MAX_PART_CODE_LENGTH} characters, got {len}"
        )));
    }
    Ok(())
}

/// Validate a part name: non-empty and at most [`MAX_PART_NAME_LENGTH`] characters.
pub fn validate_part_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Part name must not be empty".to_string(),
        ));
    }
    let len = name.chars().count();
    if len > MAX_PART_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Part name must not exceed {MAX_PART_NAME_LENGTH} characters, got {len}"
        )));
    }
    Ok(())
}

/// Validate the quantity of a non-root node.
pub fn validate_quantity(quantity: i32) -> Result<(), CoreError> {
    if quantity < MIN_QUANTITY {
        return Err(CoreError::Validation(format!(
            "Quantity must be at least {MIN_QUANTITY}, got {quantity}"
        )));
    }
    Ok(())
}

/// Error returned when an operation names a part code missing from the catalog.
pub fn unknown_part_code(code: &str) -> CoreError {
    CoreError::Validation(format!("Unknown part code '{code}'"))
}

/// Reject sibling insertion next to the product root.
pub fn validate_sibling_reference(product_id: DbId, reference_id: DbId) -> Result<(), CoreError> {
    if product_id == reference_id {
        return Err(CoreError::Validation(
            "A product root has no siblings; insert a child instead".to_string(),
        ));
    }
    Ok(())
}

/// Reject drag/drop requests that can never be valid regardless of tree shape.
pub fn validate_move(
    product_id: DbId,
    dragged_id: DbId,
    drop_target_id: DbId,
) -> Result<(), CoreError> {
    if dragged_id == product_id {
        return Err(CoreError::Validation(
            "The product root cannot be moved".to_string(),
        ));
    }
    if drop_target_id == product_id {
        return Err(CoreError::Validation(
            "Nodes cannot be dropped beside the product root".to_string(),
        ));
    }
    if dragged_id == drop_target_id {
        return Err(CoreError::Validation(
            "A node cannot be dropped onto itself".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Insert position
// ---------------------------------------------------------------------------

/// Where a dragged node lands relative to its drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertPosition {
    Before,
    After,
}

impl InsertPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }

    /// Sort key the dragged node takes, given the drop target's sort key
    /// before any shifting.
    pub fn landing_sort_key(self, target_sort_key: i32) -> i32 {
        match self {
            Self::Before => target_sort_key,
            Self::After => target_sort_key + 1,
        }
    }

    /// Lowest sibling sort key that must shift to make room.
    pub fn first_shifted_sort_key(self, target_sort_key: i32) -> i32 {
        match self {
            Self::Before => target_sort_key,
            Self::After => target_sort_key + 1,
        }
    }
}

impl std::fmt::Display for InsertPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn part_code_accepts_short_codes() {
        assert!(validate_part_code("A").is_ok());
        assert!(validate_part_code("B12").is_ok());
    }

    #[test]
    fn part_code_rejects_empty_and_long() {
        assert_matches!(validate_part_code(""), Err(CoreError::Validation(_)));
        assert_matches!(validate_part_code("  "), Err(CoreError::Validation(_)));
        let msg = validate_part_code("ABCD").unwrap_err().to_string();
        assert!(msg.contains("3 characters"));
    }

    #[test]
    fn part_code_rejects_padding() {
        assert!(validate_part_code(" A").is_err());
    }

    #[test]
    fn part_name_limits() {
        assert!(validate_part_name("Wheel").is_ok());
        assert!(validate_part_name("").is_err());
        assert!(validate_part_name(&"x".repeat(256)).is_err());
        assert!(validate_part_name(&"x".repeat(255)).is_ok());
    }

    #[test]
    fn quantity_must_be_positive() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(40).is_ok());
        assert_matches!(validate_quantity(0), Err(CoreError::Validation(_)));
        assert_matches!(validate_quantity(-2), Err(CoreError::Validation(_)));
    }

    #[test]
    fn root_has_no_siblings() {
        assert!(validate_sibling_reference(1, 1).is_err());
        assert!(validate_sibling_reference(1, 2).is_ok());
    }

    #[test]
    fn move_rejects_root_and_self_drops() {
        assert!(validate_move(1, 1, 5).is_err());
        assert!(validate_move(1, 5, 1).is_err());
        assert!(validate_move(1, 5, 5).is_err());
        assert!(validate_move(1, 5, 6).is_ok());
    }

    #[test]
    fn insert_position_displays_as_wire_name() {
        assert_eq!(InsertPosition::Before.to_string(), "before");
        assert_eq!(InsertPosition::After.to_string(), "after");
    }

    #[test]
    fn landing_sort_keys() {
        assert_eq!(InsertPosition::Before.landing_sort_key(3), 3);
        assert_eq!(InsertPosition::After.landing_sort_key(3), 4);
        assert_eq!(InsertPosition::Before.first_shifted_sort_key(3), 3);
        assert_eq!(InsertPosition::After.first_shifted_sort_key(3), 4);
    }
}
