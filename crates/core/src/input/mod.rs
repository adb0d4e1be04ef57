pub mod confidence;
pub mod mapping;
pub mod normalizer;
pub mod remap;

pub use confidence::ConfidenceTracker;
pub use mapping::{Action, ButtonMapping};
pub use normalizer::{ActionSnapshot, Edges, Normalized, RawSample};
pub use remap::{RemapOutcome, RemapSession};
