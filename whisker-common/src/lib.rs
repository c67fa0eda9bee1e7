//! # Whisker Common Library
//!
//! Shared code for the whisker recognition crates including:
//! - Breed catalog and profile records
//! - Event types (WhiskerEvent enum)
//! - Configuration and assets-root resolution
//! - Bundled asset layout

pub mod assets;
pub mod breeds;
pub mod config;
pub mod error;
pub mod events;

pub use assets::AssetLayout;
pub use breeds::{BreedCatalog, BreedProfile};
pub use config::RecognitionSettings;
pub use error::{Error, Result};
