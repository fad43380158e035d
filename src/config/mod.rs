pub mod cli;
pub mod file;

use crate::core::tokenizer::Delimiters;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};

/// Receiver-specific convention for the NAD name composite. Border
/// authorities differ on the order, so this is configuration rather than a
/// hard-coded layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameOrder {
    #[default]
    SurnameFirst,
    GivenFirst,
}

/// Positional layout of the DOC detail composite after the document number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocLayout {
    /// number : nationality : issuing country
    #[default]
    NumberNationalityIssuing,
    /// number : issuing country : nationality
    NumberIssuingNationality,
}

/// Feature flags: each one independently toggles emission of the
/// corresponding segment group on the encode side.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentFlags {
    pub has_bags: bool,
    pub has_seats: bool,
    pub has_documents: bool,
    pub has_payment: bool,
    pub is_codeshare: bool,
    pub is_thru_flight: bool,
    pub has_phones: bool,
    pub has_agency: bool,
    pub has_credit_card: bool,
}

impl SegmentFlags {
    pub fn all() -> Self {
        Self {
            has_bags: true,
            has_seats: true,
            has_documents: true,
            has_payment: true,
            is_codeshare: true,
            is_thru_flight: true,
            has_phones: true,
            has_agency: true,
            has_credit_card: true,
        }
    }
}

/// Per-call codec configuration. Passed explicitly into each decode/encode
/// call; there is no process-wide state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub delimiters: Delimiters,
    pub name_order: NameOrder,
    pub doc_layout: DocLayout,
    /// Recipient authority code placed in the interchange header.
    pub receiver: String,
    pub flags: SegmentFlags,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            delimiters: Delimiters::default(),
            name_order: NameOrder::default(),
            doc_layout: DocLayout::default(),
            receiver: "USCBP".to_string(),
            flags: SegmentFlags::default(),
        }
    }
}

impl Validate for CodecConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("receiver", &self.receiver)?;
        validation::validate_distinct_chars(
            "delimiters",
            &[
                self.delimiters.segment,
                self.delimiters.element,
                self.delimiters.component,
                self.delimiters.release,
            ],
        )
    }
}
