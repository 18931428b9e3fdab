pub mod handlers;
pub mod normalizer;
pub mod poll;
pub mod prompt_analysis;
pub mod replicate;
pub mod router;
pub mod types;
pub mod validation;

pub use router::videogen_router;
