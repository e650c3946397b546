//! Listing-page summaries and detail payloads
//!
//! These are transient: summaries live for one page, payloads only until the
//! record builder has consumed them.

/// Lifecycle flag reported for a listing item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    Open,
    Archived,
    Unknown,
}

impl Lifecycle {
    /// Maps the job board's `type` field onto a lifecycle flag
    pub fn from_listing_type(value: Option<&str>) -> Self {
        match value {
            Some("open") => Self::Open,
            Some("archived") | Some("closed") => Self::Archived,
            _ => Self::Unknown,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

/// One item of a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSummary {
    /// External identifier
    pub id: String,

    /// Position title, if the listing carried one
    pub title: Option<String>,

    /// Employer name, if the listing carried one
    pub company: Option<String>,

    /// Whether the employer is flagged as trusted
    pub trusted: bool,

    /// Listing lifecycle flag
    pub lifecycle: Lifecycle,

    /// Where the detail fetch should go
    pub detail_url: Option<String>,
}

impl ItemSummary {
    /// Returns `(title, company)` when both required fields are present
    pub fn headline(&self) -> Option<(&str, &str)> {
        let title = self.title.as_deref().filter(|s| !s.trim().is_empty())?;
        let company = self.company.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((title, company))
    }
}

/// Raw content extracted from one detail response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailPayload {
    /// Description text, possibly padded with blank lines
    pub description: String,

    /// Skill labels as found, in document order
    pub skills: Vec<String>,
}
