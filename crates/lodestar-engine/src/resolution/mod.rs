pub mod cache;
pub mod classifier;
pub mod engine;
pub mod extractor;
pub mod fuzzy;
pub mod result;
pub mod scorer;
pub mod synthesizer;
pub mod verifier;
pub mod visual;

pub use cache::ResolutionCache;
pub use engine::{LocatorEngine, Ranking};
pub use result::ResolveError;
pub use scorer::{Candidate, ScoreBreakdown};
pub use verifier::Rejection;
