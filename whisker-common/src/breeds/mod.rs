//! Breed reference data
//!
//! Catalog of known cat breeds with label, name, and model-index resolution.

mod catalog;
mod profile;

pub use catalog::BreedCatalog;
pub use profile::BreedProfile;
