use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a sound source started through an
    /// [`AudioService`](crate::audio::AudioService).
    pub struct SourceId;
}

/// Identifies a loaded sound buffer. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoundBufferId(pub u32);

/// Position of a car within its train, counted from the front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CarIndex(pub usize);
