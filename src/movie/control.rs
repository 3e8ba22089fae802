//! Per-tick movie state machine driven by frontend requests.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use super::{FRAME_INDEX_CAPACITY, MovieHandle, MovieState};
use crate::protocol::Result;
use crate::session::{Content, Core, Notifier};

/// Movie configuration options.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovieConfig {
    /// Recording path without slot suffix or extension.
    pub base_path: PathBuf,
    /// Save-state slot; nonzero slots are appended to the file name.
    pub state_slot: u32,
    /// Frames remembered for rewinding.
    pub index_capacity: usize,
}

impl Default for MovieConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("movie"),
            state_slot: 0,
            index_capacity: FRAME_INDEX_CAPACITY,
        }
    }
}

impl MovieConfig {
    /// File a new recording goes to: `{base}{slot}.bsv`, or `{base}.bsv`
    /// for slot 0.
    #[must_use]
    pub fn record_path(&self) -> PathBuf {
        let mut name = OsString::from(self.base_path.as_os_str());
        if self.state_slot > 0 {
            name.push(self.state_slot.to_string());
        }
        name.push(".bsv");
        PathBuf::from(name)
    }
}

/// Owns at most one open movie and turns requests into transitions.
///
/// Requests only take effect on the next [`check`](Self::check).
#[derive(Debug, Default)]
pub struct MovieController {
    config: MovieConfig,
    handle: Option<MovieHandle>,
    playback_request: Option<PathBuf>,
    record_request: bool,
    stop_request: bool,
    end_signaled: bool,
    finished: bool,
}

impl MovieController {
    /// Create an idle controller.
    #[must_use]
    pub fn new(config: MovieConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &MovieConfig {
        &self.config
    }

    /// Change the slot used for the next recording.
    pub fn set_state_slot(&mut self, slot: u32) {
        self.config.state_slot = slot;
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> MovieState {
        match &self.handle {
            Some(handle) => handle.state(),
            None if self.finished => MovieState::Finished,
            None => MovieState::Uninitialized,
        }
    }

    /// The open movie, if any.
    pub fn handle_mut(&mut self) -> Option<&mut MovieHandle> {
        self.handle.as_mut()
    }

    /// Ask to play `path` back.
    pub fn request_playback(&mut self, path: impl AsRef<Path>) {
        self.playback_request = Some(path.as_ref().to_path_buf());
    }

    /// Ask to start recording.
    pub fn request_record(&mut self) {
        self.record_request = true;
    }

    /// Ask to stop whatever is running.
    pub fn request_stop(&mut self) {
        self.stop_request = true;
    }

    /// Mark the playing movie as exhausted.
    pub fn signal_end(&mut self) {
        self.end_signaled = true;
    }

    /// Apply pending requests. Returns whether a movie started or stopped.
    pub fn check<C, T>(&mut self, core: &mut C, content: &T, notifier: &mut dyn Notifier) -> bool
    where
        C: Core + ?Sized,
        T: Content + ?Sized,
    {
        match self.handle.take() {
            None => self.start(core, content, notifier),
            Some(handle) => self.maybe_stop(handle, notifier),
        }
    }

    fn start<C, T>(&mut self, core: &mut C, content: &T, notifier: &mut dyn Notifier) -> bool
    where
        C: Core + ?Sized,
        T: Content + ?Sized,
    {
        let capacity = self.config.index_capacity;

        if let Some(path) = self.playback_request.take() {
            return match MovieHandle::init_playback_with_capacity(&path, core, content.crc(), capacity) {
                Ok(handle) => {
                    info!(path = %path.display(), "movie playback started");
                    notifier.notify("Starting movie playback.");
                    self.activate(handle);
                    true
                }
                Err(err) => {
                    error!(path = %path.display(), error = %err, "failed to load movie");
                    notifier.notify(&format!("Failed to load movie file: \"{}\".", path.display()));
                    false
                }
            };
        }

        if std::mem::take(&mut self.record_request) {
            let path = self.config.record_path();
            return match MovieHandle::init_record_with_capacity(&path, core, content.crc(), capacity) {
                Ok(handle) => {
                    let msg = format!("Starting movie record to \"{}\".", path.display());
                    info!("{msg}");
                    notifier.notify(&msg);
                    self.activate(handle);
                    true
                }
                Err(err) => {
                    error!(path = %path.display(), error = %err, "failed to start movie record");
                    notifier.notify("Failed to start movie record.");
                    false
                }
            };
        }
        false
    }

    fn activate(&mut self, handle: MovieHandle) {
        self.handle = Some(handle);
        self.stop_request = false;
        self.end_signaled = false;
        self.finished = false;
    }

    fn maybe_stop(&mut self, mut handle: MovieHandle, notifier: &mut dyn Notifier) -> bool {
        let message = if handle.is_playback() {
            if !(self.end_signaled || self.stop_request) {
                self.handle = Some(handle);
                return false;
            }
            "Movie playback ended."
        } else {
            if !self.stop_request {
                self.handle = Some(handle);
                return false;
            }
            "Movie record stopped."
        };

        info!(path = %handle.path().display(), "{message}");
        notifier.notify(message);
        if let Err(err) = handle.finalize() {
            warn!(error = %err, "failed to close movie");
        }
        self.stop_request = false;
        self.end_signaled = false;
        self.finished = true;
        true
    }

    /// Next recorded input during playback.
    ///
    /// Once the log runs out the movie is marked ended and the next
    /// [`check`](Self::check) closes it.
    pub fn poll_input(&mut self) -> Result<Option<i16>> {
        let Some(handle) = self.handle.as_mut().filter(|h| h.is_playback()) else {
            return Ok(None);
        };
        let value = handle.get_input()?;
        if value.is_none() {
            self.end_signaled = true;
        }
        Ok(value)
    }

    /// Log an input while recording; ignored otherwise.
    pub fn record_input(&mut self, value: i16) -> Result<()> {
        match self.handle.as_mut() {
            Some(handle) if !handle.is_playback() => handle.set_input(value),
            _ => Ok(()),
        }
    }
}
