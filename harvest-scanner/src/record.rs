/// Placeholder written for any reviewer field the page did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRecord {
    pub reviewer_name: String,
    pub reviewer_company: String,
    pub reviewer_location: String,
    pub reviewer_company_size: String,
    pub review_type: String,
}

impl ReviewRecord {
    pub fn new(
        reviewer_name: impl Into<String>,
        reviewer_company: impl Into<String>,
        reviewer_location: impl Into<String>,
        reviewer_company_size: impl Into<String>,
        review_type: impl Into<String>,
    ) -> Self {
        Self {
            reviewer_name: reviewer_name.into(),
            reviewer_company: reviewer_company.into(),
            reviewer_location: reviewer_location.into(),
            reviewer_company_size: reviewer_company_size.into(),
            review_type: review_type.into(),
        }
    }

    /// Values in the order rows are written to an export.
    pub fn values(&self) -> [&str; 5] {
        [
            &self.reviewer_name,
            &self.reviewer_company,
            &self.reviewer_location,
            &self.reviewer_company_size,
            &self.review_type,
        ]
    }
}

impl Default for ReviewRecord {
    fn default() -> Self {
        Self::new(
            NOT_AVAILABLE,
            NOT_AVAILABLE,
            NOT_AVAILABLE,
            NOT_AVAILABLE,
            NOT_AVAILABLE,
        )
    }
}
