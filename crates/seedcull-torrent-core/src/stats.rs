//! Health and seeding scores derived from a torrent telemetry snapshot.
//!
//! # Design
//! - Health covers the download phase: a torrent stuck in a stalled or
//!   metadata state loses score linearly once its grace period runs out;
//!   progress earns the score back.
//! - Seeding covers the post-download phase: either enough ratio (scaled by
//!   payload size) or enough seed time makes the torrent ok.
//! - Both scores are pure functions of the snapshot, the clock, and the limits.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{ClientState, Torrent, to_f64};
use crate::score::Score;

/// Lower clamp for the size-scaled target ratio.
pub const MIN_TARGET_RATIO: f64 = 1.0;
/// Upper clamp for the size-scaled target ratio.
pub const MAX_TARGET_RATIO: f64 = 10.0;

const GIB: u64 = 1024 * 1024 * 1024;
const DAY: Duration = Duration::from_secs(86_400);

/// Tunables for health and seeding scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedLimits {
    /// Time over which a stalled download loses one unit of health.
    pub dl_time_limit: Duration,
    /// Time a stalled download is tolerated before losing health.
    pub dl_grace: Duration,
    /// Ratio a payload of `min_seed_max_size` bytes must reach.
    pub min_seed_ratio: f64,
    /// Reference payload size for `min_seed_ratio`; larger payloads need less.
    pub min_seed_max_size: u64,
    /// Seed time after which a torrent is ok regardless of ratio.
    pub seed_time_limit: Duration,
}

impl Default for SeedLimits {
    fn default() -> Self {
        Self {
            dl_time_limit: DAY * 2,
            dl_grace: DAY,
            min_seed_ratio: 10.0,
            min_seed_max_size: 15 * GIB,
            seed_time_limit: DAY * 4,
        }
    }
}

/// Scores computed for one torrent at one instant.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct SeedStats {
    /// Download-phase viability.
    pub health: Score,
    /// Post-download sufficiency.
    pub seeding: Score,
    /// Ratio this torrent must reach, given its size.
    pub target_ratio: f64,
    /// Time since completion; `None` until the download finishes.
    #[serde(skip)]
    pub seed_time: Option<Duration>,
}

impl SeedStats {
    /// Score a torrent snapshot against `limits` at `now`.
    #[must_use]
    pub fn compute(torrent: &Torrent, now: DateTime<Utc>, limits: &SeedLimits) -> Self {
        let time_active = elapsed(torrent.added_on, now);
        let seed_time = if torrent.is_complete() {
            torrent.completion_on.map(|at| elapsed(at, now))
        } else {
            None
        };

        Self {
            health: health_score(torrent.state, torrent.progress, time_active, limits),
            seeding: seeding_score(
                torrent.effective_ratio(),
                seed_time,
                torrent.size,
                limits,
            ),
            target_ratio: target_ratio(torrent.size, limits),
            seed_time,
        }
    }
}

/// Health of a download given how long it has been active.
///
/// Complete torrents and torrents outside the stalled/metadata states are
/// healthy by definition.
#[must_use]
pub fn health_score(
    state: ClientState,
    progress: f64,
    time_active: Duration,
    limits: &SeedLimits,
) -> Score {
    if progress >= 1.0 || !state.is_stalled() {
        return Score::PERFECT;
    }
    let overdue = time_active.saturating_sub(limits.dl_grace);
    let decay = ratio_of(overdue, limits.dl_time_limit);
    Score::new((2.0 - decay).max(0.0) + progress.max(0.0))
}

/// Ratio a payload of `size` bytes must reach, clamped to
/// [`MIN_TARGET_RATIO`]..=[`MAX_TARGET_RATIO`].
#[must_use]
pub fn target_ratio(size: u64, limits: &SeedLimits) -> f64 {
    let reference = to_f64(limits.min_seed_max_size) * limits.min_seed_ratio;
    let target = if size == 0 {
        MAX_TARGET_RATIO
    } else {
        reference / to_f64(size)
    };
    target.clamp(MIN_TARGET_RATIO, MAX_TARGET_RATIO)
}

/// Seeding sufficiency: the better of ratio progress and seed-time progress.
#[must_use]
pub fn seeding_score(
    ratio: f64,
    seed_time: Option<Duration>,
    size: u64,
    limits: &SeedLimits,
) -> Score {
    let by_ratio = Score::new(ratio.max(0.0) / target_ratio(size, limits));
    match seed_time {
        Some(seed_time) => {
            by_ratio.max(Score::new(ratio_of(seed_time, limits.seed_time_limit)))
        }
        None => by_ratio,
    }
}

fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or(Duration::ZERO)
}

fn ratio_of(value: Duration, limit: Duration) -> f64 {
    if limit.is_zero() {
        return if value.is_zero() { 0.0 } else { f64::INFINITY };
    }
    value.as_secs_f64() / limit.as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn limits() -> SeedLimits {
        SeedLimits {
            dl_time_limit: DAY,
            dl_grace: DAY,
            min_seed_ratio: 10.0,
            min_seed_max_size: 15 * GIB,
            seed_time_limit: DAY * 4,
        }
    }

    fn torrent(state: ClientState, progress: f64, added_days_ago: i64) -> Torrent {
        let now = Utc::now();
        Torrent {
            hash: "deadbeef".into(),
            name: "Some.Show.S01E01".into(),
            category: "tv".into(),
            size: GIB,
            progress,
            ratio: 0.0,
            state,
            added_on: now - ChronoDuration::days(added_days_ago),
            completion_on: None,
            availability: 0.0,
            path: "/downloads/Some.Show.S01E01".into(),
            status: None,
            pvr: None,
            download_client_id: None,
        }
    }

    fn approx(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }

    #[test]
    fn seeding_score_matches_reference_values() {
        let limits = limits();
        let score = |ratio: f64, seed_days: u64, size: u64| {
            let seed_time = Some(DAY * u32::try_from(seed_days).unwrap_or(0));
            seeding_score(ratio, seed_time, size, &limits).value()
        };
        assert!(approx(score(9.0, 0, 1024), 0.9));
        assert!(approx(score(9.0, 0, 150 * GIB), 9.0));
        assert!(approx(score(10.0, 0, 30 * GIB), 2.0));
        assert!(approx(score(1.0, 0, 1024), 0.1));
        assert!(approx(score(1.0, 2, 1024), 0.5));
        assert!(approx(score(1.0, 4, 1024), 1.0));
    }

    #[test]
    fn target_ratio_scales_inversely_with_size() {
        let limits = SeedLimits::default();
        assert!(approx(target_ratio(10 * GIB, &limits), 10.0));
        assert!(approx(target_ratio(16 * GIB, &limits), 9.375));
        assert!(approx(target_ratio(0, &limits), MAX_TARGET_RATIO));

        let mut previous = f64::INFINITY;
        for gib in [1_u64, 5, 15, 16, 30, 75, 150, 300, 1_000] {
            let target = target_ratio(gib * GIB, &limits);
            assert!(target <= previous, "target must not grow with size");
            assert!((MIN_TARGET_RATIO..=MAX_TARGET_RATIO).contains(&target));
            previous = target;
        }
    }

    #[test]
    fn seeding_score_is_monotone_in_ratio_and_seed_time() {
        let limits = limits();
        let size = 20 * GIB;
        let mut last = 0.0;
        for step in 0..40 {
            let ratio = f64::from(step) * 0.5;
            let value = seeding_score(ratio, None, size, &limits).value();
            assert!(value >= last);
            last = value;
        }
        let mut last = 0.0;
        for hours in (0..200).step_by(7) {
            let seed_time = Some(Duration::from_secs(hours * 3_600));
            let value = seeding_score(0.3, seed_time, size, &limits).value();
            assert!(value >= last);
            last = value;
        }
    }

    #[test]
    fn health_is_perfect_when_complete_or_not_stalled() {
        let limits = limits();
        let ancient = Duration::from_secs(86_400 * 365);
        assert_eq!(
            health_score(ClientState::StalledDownload, 1.0, ancient, &limits),
            Score::PERFECT
        );
        assert_eq!(
            health_score(ClientState::Downloading, 0.0, ancient, &limits),
            Score::PERFECT
        );
        assert_eq!(
            health_score(ClientState::PausedDownload, 0.1, ancient, &limits),
            Score::PERFECT
        );
    }

    #[test]
    fn stalled_download_decays_after_grace() {
        let limits = limits();
        let within_grace = health_score(ClientState::StalledDownload, 0.0, DAY / 2, &limits);
        assert!(approx(within_grace.value(), 2.0));

        let one_limit_late = health_score(ClientState::FetchingMetadata, 0.0, DAY * 2, &limits);
        assert!(approx(one_limit_late.value(), 1.0));
        assert!(one_limit_late.is_ok());

        let dead = health_score(ClientState::StalledDownload, 0.0, DAY * 3, &limits);
        assert!(approx(dead.value(), 0.0));
        assert!(!dead.is_ok());

        let partial = health_score(ClientState::StalledDownload, 0.6, DAY * 10, &limits);
        assert!(approx(partial.value(), 0.6));
    }

    #[test]
    fn compute_uses_added_and_completion_times() {
        let limits = limits();
        let now = Utc::now();

        let stalled = torrent(ClientState::StalledDownload, 0.0, 3);
        let stats = SeedStats::compute(&stalled, now, &limits);
        assert!(!stats.health.is_ok());
        assert!(stats.seed_time.is_none());

        let mut seeded = torrent(ClientState::StalledUpload, 1.0, 30);
        seeded.ratio = 0.2;
        seeded.completion_on = Some(now - ChronoDuration::days(5));
        let stats = SeedStats::compute(&seeded, now, &limits);
        assert!(stats.health.is_ok());
        assert!(stats.seeding.is_ok(), "five days of seeding beats the four day limit");

        let mut incomplete = torrent(ClientState::Downloading, 0.9, 30);
        incomplete.completion_on = Some(now - ChronoDuration::days(5));
        let stats = SeedStats::compute(&incomplete, now, &limits);
        assert!(stats.seed_time.is_none(), "seed time only counts once complete");
        assert!(!stats.seeding.is_ok());
    }
}
