//! Derivation of the regional block sub-record from the technique.

use super::text::optional_text;
use super::{ValidationError, ValidationRule};
use crate::models::{is_regional_technique, BlockDetails, BlockInput, BlockSide};

/// Compute block details for a technique.
///
/// Regional techniques always get a block record; unfilled text fields become
/// empty strings, side defaults to Left and ultrasound guidance to false.
/// For any other technique the block input is discarded, not rejected.
pub fn derive_block_details(
    technique: &str,
    input: &BlockInput,
) -> Result<Option<BlockDetails>, ValidationError> {
    if !is_regional_technique(technique) {
        if !input.is_empty() {
            tracing::debug!(
                technique = technique.trim(),
                "Discarding block input for non-regional technique"
            );
        }
        return Ok(None);
    }

    let block_type = optional_text("blockType", input.block_type.as_deref(), false)?;
    let level = optional_text("blockLevel", input.level.as_deref(), false)?;
    let local_anesthetic =
        optional_text("blockLocalAnesthetic", input.local_anesthetic.as_deref(), false)?;

    let side = match input.side.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => BlockSide::Left,
        Some(raw) => BlockSide::parse(raw).ok_or_else(|| {
            ValidationError::new(
                "blockSide",
                ValidationRule::NotInVocabulary {
                    allowed: BlockSide::labels(),
                },
            )
        })?,
    };

    Ok(Some(BlockDetails {
        block_type: block_type.unwrap_or_default(),
        level: level.unwrap_or_default(),
        side,
        is_ultrasound_guided: input.is_ultrasound_guided.unwrap_or(false),
        local_anesthetic: local_anesthetic.unwrap_or_default(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subarachnoid_left() -> BlockInput {
        BlockInput {
            block_type: Some("Subarachnoid".into()),
            side: Some("Left".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_regional_keeps_block() {
        let block = derive_block_details("Spinal", &subarachnoid_left())
            .unwrap()
            .unwrap();
        assert_eq!(block.block_type, "Subarachnoid");
        assert_eq!(block.side, BlockSide::Left);
        assert_eq!(block.level, "");
        assert!(!block.is_ultrasound_guided);
    }

    #[test]
    fn test_regional_without_input_gets_defaults() {
        let block = derive_block_details("Epidural", &BlockInput::default())
            .unwrap()
            .unwrap();
        assert_eq!(block.side, BlockSide::Left);
        assert_eq!(block.block_type, "");
        assert_eq!(block.local_anesthetic, "");
    }

    #[test]
    fn test_non_regional_discards_block() {
        assert_eq!(derive_block_details("GA", &subarachnoid_left()).unwrap(), None);
        assert_eq!(
            derive_block_details("MAC/Sedation", &subarachnoid_left()).unwrap(),
            None
        );
        assert_eq!(
            derive_block_details("Awake fibreoptic", &subarachnoid_left()).unwrap(),
            None
        );
    }

    #[test]
    fn test_invalid_side_rejected_only_for_regional() {
        let input = BlockInput {
            side: Some("Middle".into()),
            ..Default::default()
        };
        let err = derive_block_details("CSE", &input).unwrap_err();
        assert_eq!(err.field, "blockSide");

        // Non-regional: discarded, so not an error
        assert_eq!(derive_block_details("GA", &input).unwrap(), None);
    }
}
