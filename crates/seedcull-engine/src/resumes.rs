//! Pause/resume optimizer for incomplete downloads.
//!
//! # Design
//! - [`Resumes::plan`] splits the incomplete downloads by a byte budget:
//!   oldest first, a torrent is resumed only while its remaining bytes still
//!   fit. Once one does not fit, every later torrent is paused as well.
//! - [`Resumes::rebalance`] keeps at least `min_active` downloads in the
//!   resume set and trades stalled resumes for moving paused downloads.
//! - [`Resumes::into_report`] drops no-op instructions: only running
//!   torrents are paused and only stopped torrents are resumed.

use seedcull_torrent_core::Torrent;

use crate::report::ResumeReport;

/// What the optimizer needs to know about a download.
pub trait Throttle {
    /// Identifier passed to pause and resume.
    fn hash(&self) -> &str;
    /// Whether the client currently lets the download transfer.
    fn is_running(&self) -> bool;
    /// Whether the download is stuck without peers or metadata.
    fn is_stalled(&self) -> bool;
}

impl Throttle for Torrent {
    fn hash(&self) -> &str {
        &self.hash
    }

    fn is_running(&self) -> bool {
        self.state.is_running()
    }

    fn is_stalled(&self) -> bool {
        self.state.is_stalled()
    }
}

impl<T: Throttle + ?Sized> Throttle for &T {
    fn hash(&self) -> &str {
        (**self).hash()
    }

    fn is_running(&self) -> bool {
        (**self).is_running()
    }

    fn is_stalled(&self) -> bool {
        (**self).is_stalled()
    }
}

/// Candidate pause and resume sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resumes<T> {
    min_active: usize,
    pause: Vec<T>,
    resume: Vec<T>,
}

impl<'a> Resumes<&'a Torrent> {
    /// Split incomplete downloads by `budget` bytes, oldest first.
    ///
    /// Complete torrents and torrents outside the download phase are ignored.
    pub fn plan(
        torrents: impl IntoIterator<Item = &'a Torrent>,
        budget: u64,
        min_active: usize,
    ) -> Self {
        let mut candidates: Vec<&Torrent> = torrents
            .into_iter()
            .filter(|torrent| !torrent.is_complete() && torrent.state.is_downloading())
            .collect();
        candidates.sort_by_key(|torrent| torrent.added_on);

        let mut left = Some(budget);
        let mut pause = Vec::new();
        let mut resume = Vec::new();
        for torrent in candidates {
            left = left.and_then(|bytes| bytes.checked_sub(torrent.remaining_bytes()));
            if left.is_some() {
                resume.push(torrent);
            } else {
                pause.push(torrent);
            }
        }
        Self::new(min_active, pause, resume)
    }
}

impl<T: Throttle> Resumes<T> {
    /// Wrap explicit sets.
    #[must_use]
    pub const fn new(min_active: usize, pause: Vec<T>, resume: Vec<T>) -> Self {
        Self {
            min_active,
            pause,
            resume,
        }
    }

    /// Downloads that should not run.
    #[must_use]
    pub fn pause(&self) -> &[T] {
        &self.pause
    }

    /// Downloads that should run.
    #[must_use]
    pub fn resume(&self) -> &[T] {
        &self.resume
    }

    /// Top the resume set up to `min_active` and swap stalled resumes for
    /// moving paused downloads. Set sizes are otherwise preserved.
    pub fn rebalance(&mut self) {
        if self.resume.len() < self.min_active {
            let wanted = (self.min_active - self.resume.len()).min(self.pause.len());
            // Stable partition: moving downloads are promoted before stalled ones.
            let (mut moving, stalled): (Vec<T>, Vec<T>) =
                self.pause.drain(..).partition(|entry| !entry.is_stalled());
            moving.extend(stalled);
            self.resume.extend(moving.drain(..wanted));
            self.pause = moving;
        }

        for slot in 0..self.resume.len() {
            if !self.resume[slot].is_stalled() {
                continue;
            }
            let Some(donor) = self.pause.iter().position(|entry| !entry.is_stalled()) else {
                break;
            };
            std::mem::swap(&mut self.resume[slot], &mut self.pause[donor]);
        }
    }

    /// Instructions that would change something.
    #[must_use]
    pub fn into_report(self) -> ResumeReport {
        ResumeReport {
            paused: self
                .pause
                .iter()
                .filter(|entry| entry.is_running())
                .map(|entry| entry.hash().to_string())
                .collect(),
            resumed: self
                .resume
                .iter()
                .filter(|entry| !entry.is_running())
                .map(|entry| entry.hash().to_string())
                .collect(),
        }
    }

    /// [`Self::rebalance`] followed by [`Self::into_report`].
    #[must_use]
    pub fn optimize(mut self) -> ResumeReport {
        self.rebalance();
        self.into_report()
    }
}
