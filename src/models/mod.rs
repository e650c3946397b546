//! Domain types shared by the harvester and the datastore
//!
//! # Components
//!
//! - `Vacancy` / `Skill`: the normalized record handed to persistence
//! - `ItemSummary` / `Lifecycle`: one entry of a listing page
//! - `DetailPayload`: raw content extracted from a detail response
//! - `build_vacancy`: the pure record builder joining the two

mod builder;
mod summary;
mod vacancy;

pub use builder::{build_vacancy, normalize_description, normalize_skills};
pub use summary::{DetailPayload, ItemSummary, Lifecycle};
pub use vacancy::{Skill, Vacancy};
