//! Core data model (spec §3): elements, sections & files (C1), matches, and
//! move reporting.

pub mod element;
pub mod match_;
pub mod moves;
pub mod section;

pub use element::Element;
pub use match_::{Match, MatchKind, MatchesAndTheirSections};
pub use moves::{ContentMigration, DominantsKey, MoveDestinations, MoveDestinationsReport};
pub use section::{File, Section, Side, Sources};
