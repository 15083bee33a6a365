//! Synthetic labeled metric series.
//!
//! `profile` holds the per-domain distributions, `archetype` samples normal
//! and anomalous values, `synthesizer` assembles one series with bounded
//! interval placement, and `builder` writes a whole corpus to disk.

pub mod archetype;
pub mod builder;
pub mod profile;
pub mod synthesizer;

pub use builder::{build_corpus, file_name, CorpusManifest, CorpusSpec, ManifestEntry};
pub use profile::{profile_for, DomainProfile};
pub use synthesizer::{
    synthesize, synthesize_with_count, synthesize_with_rng, Placement, MAX_PLACEMENT_ATTEMPTS,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("series length {length} leaves no room for interval starts (margins {head}+{tail})")]
    SeriesTooShort {
        length: usize,
        head: usize,
        tail: usize,
    },

    #[error(
        "could not place interval {index} of {requested} at least {min_distance} apart \
         in a series of length {length} after {attempts} attempts"
    )]
    PlacementExhausted {
        index: usize,
        requested: usize,
        min_distance: usize,
        attempts: usize,
        length: usize,
    },

    #[error("invalid profile: {0}")]
    InvalidProfile(String),
}
