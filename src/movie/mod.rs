//! Input movie recording and playback.

mod control;
mod handle;
mod index;

pub use control::{MovieConfig, MovieController};
pub use handle::MovieHandle;
pub use index::{FRAME_INDEX_CAPACITY, FrameIndex};

/// Lifecycle of a movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovieState {
    /// No movie open.
    #[default]
    Uninitialized,
    /// Writing inputs to a file.
    Recording,
    /// Reading inputs from a file.
    Playing,
    /// The movie was closed.
    Finished,
}
