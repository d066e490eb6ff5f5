use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::SourceId;

/// Shared reference to decoded audio, one `Vec<f32>` per channel.
///
/// The buffer is owned by the loading layer; state and engine commands only
/// pass the reference around. Equality checks identity first and falls back
/// to comparing samples.
#[derive(Clone, Default)]
pub struct SampleBuffer(Arc<Vec<Vec<f32>>>);

impl SampleBuffer {
    pub fn new(channels: Vec<Vec<f32>>) -> Self {
        Self(Arc::new(channels))
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.0
    }

    pub fn channel_count(&self) -> usize {
        self.0.len()
    }

    /// Length in frames (the longest channel).
    pub fn frames(&self) -> usize {
        self.0.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn ptr_eq(&self, other: &SampleBuffer) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for SampleBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0 == *other.0
    }
}

impl fmt::Debug for SampleBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SampleBuffer({} ch x {} frames)",
            self.channel_count(),
            self.frames()
        )
    }
}

/// An identified sample buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    pub name: String,
    #[serde(skip)]
    pub buffer: SampleBuffer,
}

impl Source {
    pub fn new(id: SourceId, buffer: SampleBuffer) -> Self {
        Self {
            name: id.to_string(),
            id,
            buffer,
        }
    }
}
