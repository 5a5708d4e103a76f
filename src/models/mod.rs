mod movie;
mod preferences;

pub use movie::{MovieRecord, ScoredCandidate};
pub use preferences::{Era, PreferencePacket};
