use crate::page::ReviewBlock;
use crate::record::{NOT_AVAILABLE, ReviewRecord};
use tracing::debug;

// Line positions inside the reviewer metadata block. Line 2 carries nothing
// we export and is skipped.
const NAME_LINE: usize = 0;
const COMPANY_LINE: usize = 1;
const LOCATION_LINE: usize = 3;
const COMPANY_SIZE_LINE: usize = 4;
const REVIEW_TYPE_LINE: usize = 5;

/// Turns reviewer metadata text into [`ReviewRecord`]s by fixed line position.
///
/// Stateless: the same text always yields the same record.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewExtractor;

impl ReviewExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract a record from one block's reviewer metadata text.
    ///
    /// Missing positions fall back to `"N/A"`; this never fails.
    pub fn extract(&self, reviewer_text: &str) -> ReviewRecord {
        let lines: Vec<&str> = reviewer_text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let field = |index: usize| {
            lines
                .get(index)
                .copied()
                .unwrap_or(NOT_AVAILABLE)
                .to_string()
        };

        ReviewRecord {
            reviewer_name: field(NAME_LINE),
            reviewer_company: field(COMPANY_LINE),
            reviewer_location: field(LOCATION_LINE),
            reviewer_company_size: field(COMPANY_SIZE_LINE),
            review_type: field(REVIEW_TYPE_LINE),
        }
    }

    /// Blocks without a reviewer section produce nothing.
    pub fn extract_block(&self, block: &ReviewBlock) -> Option<ReviewRecord> {
        block.reviewer.as_deref().map(|text| self.extract(text))
    }

    /// Extract every block on a page, keeping document order.
    pub fn extract_page(&self, blocks: &[ReviewBlock]) -> Vec<ReviewRecord> {
        let records: Vec<ReviewRecord> = blocks
            .iter()
            .filter_map(|block| self.extract_block(block))
            .collect();
        debug!(
            "Extracted {} records from {} review blocks",
            records.len(),
            blocks.len()
        );
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_BLOCK: &str = "Jane Doe\nCTO, Acme Corp\nVerified\nAustin, Texas\n51-200 Employees\nOnline Review";

    #[test]
    fn test_extract_full_block() {
        let record = ReviewExtractor::new().extract(FULL_BLOCK);

        assert_eq!(record.reviewer_name, "Jane Doe");
        assert_eq!(record.reviewer_company, "CTO, Acme Corp");
        assert_eq!(record.reviewer_location, "Austin, Texas");
        assert_eq!(record.reviewer_company_size, "51-200 Employees");
        assert_eq!(record.review_type, "Online Review");
    }

    #[test]
    fn test_blank_lines_and_padding_are_ignored() {
        let text = "\n   Jane Doe  \n\n\tCTO, Acme Corp\n  \nVerified\nAustin, Texas\n";
        let record = ReviewExtractor::new().extract(text);

        assert_eq!(record.reviewer_name, "Jane Doe");
        assert_eq!(record.reviewer_company, "CTO, Acme Corp");
        assert_eq!(record.reviewer_location, "Austin, Texas");
        assert_eq!(record.reviewer_company_size, NOT_AVAILABLE);
        assert_eq!(record.review_type, NOT_AVAILABLE);
    }

    #[test]
    fn test_short_block_fills_sentinels() {
        let record = ReviewExtractor::new().extract("Anonymous");

        assert_eq!(record.reviewer_name, "Anonymous");
        assert_eq!(record.reviewer_company, NOT_AVAILABLE);
        assert_eq!(record.reviewer_location, NOT_AVAILABLE);
        assert_eq!(record.reviewer_company_size, NOT_AVAILABLE);
        assert_eq!(record.review_type, NOT_AVAILABLE);
    }

    #[test]
    fn test_empty_text_is_all_sentinels() {
        let record = ReviewExtractor::new().extract("");
        assert_eq!(record, ReviewRecord::default());
    }

    #[test]
    fn test_line_two_is_skipped() {
        let record = ReviewExtractor::new().extract("a\nb\nc\nd");
        assert_eq!(record.reviewer_location, "d");
        assert!(!record.values().contains(&"c"));
    }

    #[test]
    fn test_extract_is_idempotent() {
        let extractor = ReviewExtractor::new();
        assert_eq!(extractor.extract(FULL_BLOCK), extractor.extract(FULL_BLOCK));
    }

    #[test]
    fn test_block_without_reviewer_section_is_skipped() {
        let blocks = vec![
            ReviewBlock::new("no reviewer here", None),
            ReviewBlock::new("full", Some(FULL_BLOCK.to_string())),
            ReviewBlock::new("partial", Some("Bob".to_string())),
        ];

        let records = ReviewExtractor::new().extract_page(&blocks);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].reviewer_name, "Jane Doe");
        assert_eq!(records[1].reviewer_name, "Bob");
        assert_eq!(records[1].review_type, NOT_AVAILABLE);
    }
}
