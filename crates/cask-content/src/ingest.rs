//! Resumable ingest of a descriptor's content into a local file.
//!
//! # State machine
//!
//! ```text
//! Fresh ──(resume.enabled, file length == resume.offset)──> Resuming
//! Fresh / Resuming ──(end of stream)──> Verifying ──> Done | Failed
//! ```
//!
//! - Resuming restores the recorded hash snapshot, opens the file for append
//!   and range-fetches from the recorded offset. A backend without range
//!   support sends the ingest back to Fresh (unless disabled in
//!   [`IngestOptions`]).
//! - Any disagreement between the file and the recorded offset or snapshot is
//!   a [`ContentError::StaleResumeState`] raised before anything is fetched.
//! - An I/O error or cancellation mid-transfer is reported without a state
//!   change. The file is cut back to the number of bytes hashed so far, so
//!   [`ResumableIngest::checkpoint`] always describes the file exactly.
//! - On a verification failure the partial file is kept and the resume
//!   annotations are not touched. Callers that want a clean slate start a
//!   fresh ingest with resume disabled.
//!
//! Only one ingest may own a given file at a time. The caller serializes
//! concurrent attempts, e.g. with a lock keyed by digest.

use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use cask_fs::partial;
use cask_verify::Hasher;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::fetch::copy_chunks;
use crate::storage::ensure_active;
use crate::{
    ContentError, Descriptor, Fetcher, IngestOptions, ReadStream, Result, ResumeState, Verifier,
};

/// Phase of a [`ResumableIngest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngestState {
    /// Downloading from offset 0.
    #[default]
    Fresh,
    /// Downloading the tail after a recorded offset.
    Resuming,
    /// Stream ended, checking size and digest.
    Verifying,
    /// The file holds verified content.
    Done,
    /// Verification failed; the file is kept but is not valid content.
    Failed,
}

impl fmt::Display for IngestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestState::Fresh => write!(f, "Fresh"),
            IngestState::Resuming => write!(f, "Resuming"),
            IngestState::Verifying => write!(f, "Verifying"),
            IngestState::Done => write!(f, "Done"),
            IngestState::Failed => write!(f, "Failed"),
        }
    }
}

/// Downloads one descriptor's content into a local file, resuming from the
/// descriptor's resume annotations when they are present.
pub struct ResumableIngest {
    descriptor: Descriptor,
    path:       PathBuf,
    options:    IngestOptions,
    state:      IngestState,
    /// Hash state matching the file contents, kept across interrupted runs.
    verifier:   Option<Verifier>,
}

impl ResumableIngest {
    pub fn new(descriptor: &Descriptor, path: impl Into<PathBuf>, options: IngestOptions) -> Self {
        Self {
            descriptor: descriptor.clone(),
            path: path.into(),
            options,
            state: IngestState::Fresh,
            verifier: None,
        }
    }

    pub fn state(&self) -> IngestState { self.state }

    pub fn path(&self) -> &Path { &self.path }

    /// Bytes in the file that the hash state already covers.
    pub fn bytes_written(&self) -> u64 {
        self.verifier.as_ref().map_or(0, Verifier::bytes_written)
    }

    /// Descriptor whose resume annotations describe the current progress.
    ///
    /// Available after an interrupted [`run`](Self::run); `None` before the
    /// first run and once the ingest has finished.
    pub fn checkpoint(&self) -> Option<Descriptor> {
        let verifier = self.verifier.as_ref()?;
        Some(ResumeState::checkpoint(self.filename(), verifier).apply(&self.descriptor))
    }

    /// `resume.filename` value for this ingest's path.
    ///
    /// Annotation values are strings, so a non-UTF-8 path is recorded lossily
    /// and compared in the same form.
    fn filename(&self) -> String { self.path.to_string_lossy().into_owned() }

    /// Drive the ingest to completion.
    ///
    /// Returns the descriptor with its resume annotations cleared. Calling
    /// `run` again after an interruption continues from where it stopped.
    pub fn run<F: Fetcher + ?Sized>(
        &mut self,
        fetcher: &F,
        cancel: &CancellationToken,
    ) -> Result<Descriptor> {
        ensure_active(cancel)?;
        if self.state == IngestState::Done {
            return Ok(ResumeState::clear(&self.descriptor));
        }

        let mut verifier = match self.verifier.take() {
            Some(verifier) => verifier,
            None => self.prepare(cancel)?,
        };

        let transferred = self
            .transfer(fetcher, cancel, &mut verifier)
            .and_then(|file| self.sync(file));
        match transferred {
            Ok(()) => self.finish(verifier),
            Err(e) => {
                self.verifier = Some(verifier);
                Err(e)
            }
        }
    }

    /// Build the verifier from the resume annotations, rejecting any state
    /// that does not match the file on disk.
    fn prepare(&mut self, cancel: &CancellationToken) -> Result<Verifier> {
        let resume = ResumeState::extract(&self.descriptor)?;
        if !resume.enabled {
            self.state = IngestState::Fresh;
            return Verifier::new(&self.descriptor);
        }

        if resume.filename.is_empty() {
            return Err(ContentError::InvalidResumeState(
                "resume enabled without a filename".to_string(),
            ));
        }
        if resume.filename != self.filename() {
            return Err(ContentError::StaleResumeState(format!(
                "resume state belongs to {}, not {}",
                resume.filename,
                self.path.display()
            )));
        }
        if resume.offset > self.descriptor.size {
            return Err(ContentError::StaleResumeState(format!(
                "offset {} is beyond content size {}",
                resume.offset, self.descriptor.size
            )));
        }

        let on_disk = partial::file_len(&self.path)?.unwrap_or(0);
        if on_disk != resume.offset {
            return Err(ContentError::StaleResumeState(format!(
                "recorded offset {} but {} holds {} bytes",
                resume.offset,
                self.path.display(),
                on_disk
            )));
        }

        let verifier = match &resume.hash_state {
            Some(snapshot) => Verifier::resume(&self.descriptor, snapshot)?,
            None => self.rehash_prefix(resume.offset, cancel)?,
        };
        if verifier.bytes_written() != resume.offset {
            return Err(ContentError::StaleResumeState(format!(
                "hash state covers {} bytes, recorded offset is {}",
                verifier.bytes_written(),
                resume.offset
            )));
        }

        info!(
            digest = %self.descriptor.digest,
            offset = resume.offset,
            path = %self.path.display(),
            "resuming ingest"
        );
        self.state = IngestState::Resuming;
        Ok(verifier)
    }

    /// Without a recorded snapshot the existing prefix is hashed again.
    fn rehash_prefix(&self, offset: u64, cancel: &CancellationToken) -> Result<Verifier> {
        let mut verifier = Verifier::new(&self.descriptor)?;
        if offset == 0 {
            return Ok(verifier);
        }

        debug!(offset, path = %self.path.display(), "no hash state recorded, rehashing prefix");
        let file = File::open(&self.path).map_err(|e| cask_fs::Error::Read {
            path:   self.path.clone(),
            source: e,
        })?;
        copy_chunks(&mut file.take(offset), cancel, self.options.buffer_size, |chunk| {
            verifier.update(chunk);
            Ok(())
        })?;
        Ok(verifier)
    }

    /// Stream the remaining content into the file and the verifier.
    fn transfer<F: Fetcher + ?Sized>(
        &mut self,
        fetcher: &F,
        cancel: &CancellationToken,
        verifier: &mut Verifier,
    ) -> Result<File> {
        let offset = verifier.bytes_written();
        if offset > 0 {
            let on_disk = partial::file_len(&self.path)?.unwrap_or(0);
            if on_disk != offset {
                return Err(ContentError::StaleResumeState(format!(
                    "hash state covers {} bytes but {} holds {}",
                    offset,
                    self.path.display(),
                    on_disk
                )));
            }
        }

        let (stream, mut file) = self.open(fetcher, cancel, verifier)?;
        let remaining = self.descriptor.size.saturating_sub(verifier.bytes_written());
        let mut stream = stream.take(remaining.saturating_add(1));

        let copied = copy_chunks(&mut stream, cancel, self.options.buffer_size, |chunk| {
            file.write_all(chunk)?;
            verifier.update(chunk);
            Ok(())
        });

        if let Err(e) = copied {
            let hashed = verifier.bytes_written();
            if let Err(trunc) = partial::truncate(&file, &self.path, hashed) {
                warn!(error = %trunc, "failed to cut ingest file back to hashed length");
            }
            warn!(
                digest = %self.descriptor.digest,
                bytes = hashed,
                error = %e,
                "ingest interrupted"
            );
            return Err(e);
        }

        Ok(file)
    }

    /// Open the backend stream and the local file for the current offset.
    fn open<F: Fetcher + ?Sized>(
        &mut self,
        fetcher: &F,
        cancel: &CancellationToken,
        verifier: &mut Verifier,
    ) -> Result<(ReadStream, File)> {
        let offset = verifier.bytes_written();
        if offset > 0 {
            match fetcher.fetch_range(cancel, &self.descriptor, offset) {
                Ok(stream) => {
                    self.state = IngestState::Resuming;
                    let file = partial::open_append(&self.path)?;
                    return Ok((stream, file));
                }
                Err(ContentError::RangeUnsupported) if self.options.range_fallback => {
                    warn!(
                        digest = %self.descriptor.digest,
                        offset,
                        "backend cannot fetch ranges, restarting from zero"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        // The file and verifier keep describing the old prefix until the
        // full stream is open and the file has been truncated.
        let fresh = Verifier::new(&self.descriptor)?;
        let stream = fetcher.fetch(cancel, &self.descriptor)?;
        let file = partial::create(&self.path)?;
        *verifier = fresh;
        self.state = IngestState::Fresh;
        Ok((stream, file))
    }

    fn sync(&self, file: File) -> Result<()> {
        if self.options.sync_on_complete {
            file.sync_all().map_err(|e| cask_fs::Error::Write {
                path:   self.path.clone(),
                source: e,
            })?;
        }
        Ok(())
    }

    fn finish(&mut self, verifier: Verifier) -> Result<Descriptor> {
        self.state = IngestState::Verifying;
        match verifier.verify() {
            Ok(()) => {
                self.state = IngestState::Done;
                info!(
                    digest = %self.descriptor.digest,
                    path = %self.path.display(),
                    "ingest verified"
                );
                Ok(ResumeState::clear(&self.descriptor))
            }
            Err(mismatch) => {
                self.state = IngestState::Failed;
                warn!(
                    digest = %self.descriptor.digest,
                    path = %self.path.display(),
                    %mismatch,
                    "ingest failed verification, partial file kept"
                );
                Err(ContentError::VerificationFailed(mismatch))
            }
        }
    }
}

/// Download `descriptor` into `path`, resuming from its resume annotations
/// when present. Returns the descriptor with resume annotations cleared.
pub fn resume_fetch<F: Fetcher + ?Sized>(
    fetcher: &F,
    cancel: &CancellationToken,
    descriptor: &Descriptor,
    path: impl Into<PathBuf>,
) -> Result<Descriptor> {
    ResumableIngest::new(descriptor, path, IngestOptions::default()).run(fetcher, cancel)
}
