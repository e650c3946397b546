use std::fmt;

/// Normalized vacancy record
///
/// Created once both the listing summary and the detail payload are
/// available; immutable afterwards. `internal_id` is the job board's own
/// identifier and the natural key in the datastore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vacancy {
    /// External identifier assigned by the job board
    pub internal_id: String,

    /// Employer name
    pub company: String,

    /// Position title
    pub carrier_position: String,

    /// Description text with blank leading/trailing lines removed
    pub description: String,

    /// Lower-cased skill tags in order of first appearance
    pub skills: Vec<Skill>,
}

/// A lower-cased skill label owned by exactly one vacancy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Skill {
    pub name: String,
}

impl Skill {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Vacancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Vacancy(internal_id={}, company={:?}, carrier_position={:?}, skills={})",
            self.internal_id,
            self.company,
            self.carrier_position,
            self.skills.len()
        )
    }
}
