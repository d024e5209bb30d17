use serde::{Deserialize, Serialize};

/// Structured fields pulled out of one OCR capture.
/// Every field is best-effort; an empty string means "not found".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub business_name: String,
    pub address: String,
    /// Full postcode (`SE1 5TR`) or a recognized area code (`SE1`).
    pub postcode: String,
    pub phone_number: String,
    pub website: String,
    pub email: String,
}

impl ExtractedFields {
    /// True when no field was extracted.
    pub fn is_empty(&self) -> bool {
        self.values().iter().all(|v| v.is_empty())
    }

    /// All field values, including empty ones.
    pub fn values(&self) -> [&str; 6] {
        [
            &self.business_name,
            &self.address,
            &self.postcode,
            &self.phone_number,
            &self.website,
            &self.email,
        ]
    }
}
