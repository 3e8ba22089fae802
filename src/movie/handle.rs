//! BSV movie files.
//!
//! ```text
//! [SessionHeader (16)] [initial state (state_size)] [input words...]
//! ```
//!
//! Input words are little-endian `i16`, one per polled input.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::MovieState;
use super::index::{FRAME_INDEX_CAPACITY, FrameIndex};
use crate::protocol::metrics::Metrics;
use crate::protocol::{Error, HEADER_SIZE, Result, SessionHeader, verify_magic};
use crate::session::Core;
use crate::session::core::state_buffer;

/// Serializer tag written into recorded headers.
const RECORD_SERIALIZER_TAG: u32 = 0;

/// An open movie, either being recorded or played back.
#[derive(Debug)]
pub struct MovieHandle {
    path: PathBuf,
    file: Option<File>,
    playback: bool,
    header: SessionHeader,
    state: Vec<u8>,
    min_file_pos: u64,
    index: Option<FrameIndex>,
    frame_ptr: usize,
    first_rewind: bool,
    did_rewind: bool,
}

impl MovieHandle {
    /// Open `path` for playback and load its initial state into `core`.
    pub fn init_playback<C: Core + ?Sized>(path: &Path, core: &mut C, content_crc: u32) -> Result<Self> {
        Self::init_playback_with_capacity(path, core, content_crc, FRAME_INDEX_CAPACITY)
    }

    /// [`init_playback`](Self::init_playback) with a custom frame index size.
    pub fn init_playback_with_capacity<C: Core + ?Sized>(
        path: &Path,
        core: &mut C,
        content_crc: u32,
        index_capacity: usize,
    ) -> Result<Self> {
        let mut file = File::open(path)?;

        let mut raw = [0u8; HEADER_SIZE];
        file.read_exact(&mut raw)?;
        let header = SessionHeader::decode(&raw)?;
        if !verify_magic(header.magic()) {
            return Err(Error::InvalidMagic {
                found: header.magic(),
            });
        }

        if header.content_crc() != content_crc {
            warn!(
                file = format_args!("{:#010x}", header.content_crc()),
                loaded = format_args!("{content_crc:#010x}"),
                "movie was recorded with different content; playback will likely desync"
            );
        }

        let state_size = header.state_size() as usize;
        let file_len = file.metadata()?.len();
        let needed = (HEADER_SIZE + state_size) as u64;
        if file_len < needed {
            return Err(Error::BadLength {
                expected: HEADER_SIZE + state_size,
                got: usize::try_from(file_len).unwrap_or(usize::MAX),
            });
        }

        let mut state = Vec::new();
        if state_size > 0 {
            state = state_buffer(state_size)?;
            file.read_exact(&mut state)?;

            if core.serialize_size() == state_size {
                if !core.unserialize(&state) {
                    warn!("core rejected the movie's initial state");
                }
            } else {
                warn!(
                    movie = state_size,
                    core = core.serialize_size(),
                    "movie state comes from a different serializer version; not loading it"
                );
            }
        }

        let min_file_pos = needed;
        let index = FrameIndex::new(index_capacity, min_file_pos)?;
        debug!(path = %path.display(), state_size, "movie opened for playback");
        Metrics::record_movie_start();
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            playback: true,
            header,
            state,
            min_file_pos,
            index: Some(index),
            frame_ptr: 0,
            first_rewind: true,
            did_rewind: false,
        })
    }

    /// Create (or truncate) `path` and write the header and initial state.
    pub fn init_record<C: Core + ?Sized>(path: &Path, core: &mut C, content_crc: u32) -> Result<Self> {
        Self::init_record_with_capacity(path, core, content_crc, FRAME_INDEX_CAPACITY)
    }

    /// [`init_record`](Self::init_record) with a custom frame index size.
    pub fn init_record_with_capacity<C: Core + ?Sized>(
        path: &Path,
        core: &mut C,
        content_crc: u32,
        index_capacity: usize,
    ) -> Result<Self> {
        let state_size = core.serialize_size();
        let header = SessionHeader::new(
            RECORD_SERIALIZER_TAG,
            content_crc,
            u32::try_from(state_size).map_err(|_| Error::ResourceExhausted {
                what: "state buffer",
                size: state_size,
            })?,
        );

        let mut state = Vec::new();
        if state_size > 0 {
            state = state_buffer(state_size)?;
            if !core.serialize(&mut state) {
                return Err(Error::Core("serialize"));
            }
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.write_all(&header.encode())?;
        file.write_all(&state)?;

        let min_file_pos = (HEADER_SIZE + state_size) as u64;
        let index = FrameIndex::new(index_capacity, min_file_pos)?;
        debug!(path = %path.display(), state_size, "movie opened for recording");
        Metrics::record_movie_start();
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            playback: false,
            header,
            state,
            min_file_pos,
            index: Some(index),
            frame_ptr: 0,
            first_rewind: true,
            did_rewind: false,
        })
    }

    /// Where this movie lives.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header read from or written to the file.
    #[must_use]
    pub fn header(&self) -> &SessionHeader {
        &self.header
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> MovieState {
        match (&self.file, self.playback) {
            (None, _) => MovieState::Finished,
            (Some(_), true) => MovieState::Playing,
            (Some(_), false) => MovieState::Recording,
        }
    }

    /// Whether this handle plays a movie back.
    #[must_use]
    pub fn is_playback(&self) -> bool {
        self.playback
    }

    /// First byte after the header and initial state.
    #[must_use]
    pub fn min_file_pos(&self) -> u64 {
        self.min_file_pos
    }

    /// Current frame slot.
    #[must_use]
    pub fn frame_ptr(&self) -> usize {
        self.frame_ptr
    }

    /// Remember where the current frame starts.
    pub fn set_frame_start(&mut self) -> Result<()> {
        let (Some(file), Some(index)) = (self.file.as_mut(), self.index.as_mut()) else {
            return Ok(());
        };
        index.set(self.frame_ptr, file.stream_position()?);
        Ok(())
    }

    /// Advance to the next frame slot.
    pub fn set_frame_end(&mut self) {
        let Some(index) = self.index.as_ref() else {
            return;
        };
        self.frame_ptr = (self.frame_ptr + 1) & index.mask();
        self.first_rewind = !self.did_rewind;
        self.did_rewind = false;
    }

    /// Step the file back by one frame.
    ///
    /// The first rewind in a row replays the current frame; later ones step
    /// back past it as well. Rewinding past the start while recording
    /// re-captures the core state as the new initial state.
    pub fn frame_rewind<C: Core + ?Sized>(&mut self, core: &mut C) -> Result<()> {
        let (Some(file), Some(index)) = (self.file.as_mut(), self.index.as_ref()) else {
            return Ok(());
        };
        self.did_rewind = true;

        if self.frame_ptr <= 1 && index.get(0) == self.min_file_pos {
            self.frame_ptr = 0;
            file.seek(SeekFrom::Start(self.min_file_pos))?;
        } else {
            let step = if self.first_rewind { 1 } else { 2 };
            self.frame_ptr = self.frame_ptr.wrapping_sub(step) & index.mask();
            file.seek(SeekFrom::Start(index.get(self.frame_ptr)))?;
        }

        if file.stream_position()? <= self.min_file_pos {
            if self.playback {
                file.seek(SeekFrom::Start(self.min_file_pos))?;
            } else {
                file.seek(SeekFrom::Start(HEADER_SIZE as u64))?;
                if !self.state.is_empty() && !core.serialize(&mut self.state) {
                    return Err(Error::Core("serialize"));
                }
                file.write_all(&self.state)?;
            }
        }
        Ok(())
    }

    /// Read the next input word. `None` once the log is exhausted.
    pub fn get_input(&mut self) -> Result<Option<i16>> {
        let Some(file) = self.file.as_mut().filter(|_| self.playback) else {
            return Ok(None);
        };
        let mut word = [0u8; 2];
        match file.read_exact(&mut word) {
            Ok(()) => Ok(Some(i16::from_le_bytes(word))),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Append an input word while recording.
    pub fn set_input(&mut self, value: i16) -> Result<()> {
        let Some(file) = self.file.as_mut().filter(|_| !self.playback) else {
            return Ok(());
        };
        file.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    /// Close the file and release buffers. Safe to call more than once.
    pub fn finalize(&mut self) -> Result<()> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };
        self.state = Vec::new();
        self.index = None;
        Metrics::record_movie_finish();
        if !self.playback {
            file.flush()?;
        }
        info!(path = %self.path.display(), "movie closed");
        Ok(())
    }
}

impl Drop for MovieHandle {
    fn drop(&mut self) {
        if let Err(err) = self.finalize() {
            warn!(error = %err, "failed to close movie");
        }
    }
}
