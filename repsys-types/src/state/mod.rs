mod playback;
mod snapshot;
mod source;
mod timing;
mod track;

pub use playback::{ChannelParams, Chunk, GlobalPlayback, TrackPlayback};
pub use snapshot::{Scene, Snapshot};
pub use source::{SampleBuffer, Source};
pub use timing::{ChannelTiming, TimingState};
pub use track::{Cue, Track};
