//! Event reconciliation for one PVR.
//!
//! # Design
//! - A PVR history is a noisy, possibly out-of-order log of download
//!   attempts. Several attempts may target the same media item (its group
//!   key), so the status of a torrent is read from the most trustworthy
//!   record of its *group*, not from the single event that names its hash.
//! - Each group keeps the latest date per (release title, event kind) and is
//!   resolved from that whole set, so arrival order never changes the
//!   outcome.
//! - Events are fed one at a time through [`Reconciler::observe`]; the
//!   returned [`ControlFlow`] tells the caller to stop pulling once every
//!   pending torrent has been matched and no matched group still rests on a
//!   grab that an older import of the same release could turn into an import.
//! - Only events declaring the reconciler's own client family take part in
//!   either matching or group resolution.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;

use chrono::{DateTime, Utc};
use seedcull_pvr::{EventKind, GroupKey, HistoryEvent};
use seedcull_torrent_core::{ClientFamily, TorrentStatus};
use tracing::trace;

/// Everything seen for one group key: latest date per title and kind.
#[derive(Debug, Default)]
struct GroupEvidence {
    latest: HashMap<(String, EventKind), DateTime<Utc>>,
}

impl GroupEvidence {
    fn record(&mut self, event: &HistoryEvent) {
        self.latest
            .entry((event.source_title.clone(), event.kind))
            .and_modify(|date| *date = (*date).max(event.date))
            .or_insert(event.date);
    }

    fn latest(&self, title: &str, kind: EventKind) -> Option<DateTime<Utc>> {
        self.latest.get(&(title.to_string(), kind)).copied()
    }

    /// Most trusted record of the group.
    ///
    /// A grab and an import of the same release title describe the same
    /// download: they fold into one import dated at the later of the two.
    /// Among what remains the newest record wins; equal dates favour a grab,
    /// then a failure, then an import, then anything else, and finally the
    /// greater title.
    fn resolve(&self) -> Option<GroupRecord<'_>> {
        self.latest
            .iter()
            .filter_map(|((title, kind), date)| {
                let date = match kind {
                    EventKind::Grabbed if self.latest(title, EventKind::Imported).is_some() => {
                        return None;
                    }
                    EventKind::Imported => self
                        .latest(title, EventKind::Grabbed)
                        .map_or(*date, |grabbed| grabbed.max(*date)),
                    _ => *date,
                };
                Some(GroupRecord {
                    kind: *kind,
                    date,
                    source_title: title,
                })
            })
            .max_by(GroupRecord::precedence)
    }
}

/// Resolved record of one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GroupRecord<'a> {
    kind: EventKind,
    date: DateTime<Utc>,
    source_title: &'a str,
}

impl GroupRecord<'_> {
    fn precedence(&self, other: &Self) -> Ordering {
        self.date
            .cmp(&other.date)
            .then_with(|| tie_rank(self.kind).cmp(&tie_rank(other.kind)))
            .then_with(|| self.source_title.cmp(other.source_title))
    }
}

const fn tie_rank(kind: EventKind) -> u8 {
    match kind {
        EventKind::Grabbed => 3,
        EventKind::Failed => 2,
        EventKind::Imported => 1,
        EventKind::Other => 0,
    }
}

#[derive(Debug, Clone)]
struct Match {
    group: GroupKey,
    download_id: String,
}

/// Final answer for one matched torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Status of the resolved group record.
    pub status: TorrentStatus,
    /// Correlation id as recorded by the PVR.
    pub download_client_id: String,
    /// Media item the torrent belongs to.
    pub group: GroupKey,
}

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    resolved: HashMap<String, Resolution>,
    unmatched: Vec<String>,
    observed: usize,
}

impl Reconciliation {
    /// Resolution for the torrent with correlation key `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Resolution> {
        self.resolved.get(&key.to_ascii_lowercase())
    }

    /// Correlation keys no event matched, sorted.
    #[must_use]
    pub fn unmatched(&self) -> &[String] {
        &self.unmatched
    }

    /// Number of matched torrents.
    #[must_use]
    pub fn matched(&self) -> usize {
        self.resolved.len()
    }

    /// Events from the reconciler's client family that were examined.
    #[must_use]
    pub const fn observed(&self) -> usize {
        self.observed
    }
}

/// Incremental reconciler over one PVR's history.
#[derive(Debug)]
pub struct Reconciler {
    family: ClientFamily,
    pending: HashSet<String>,
    groups: HashMap<GroupKey, GroupEvidence>,
    matches: HashMap<String, Match>,
    matched_groups: HashSet<GroupKey>,
    awaiting_import: HashSet<GroupKey>,
    observed: usize,
}

impl Reconciler {
    /// Start reconciling the torrents identified by `keys` (any case).
    pub fn new(family: ClientFamily, keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            family,
            pending: keys
                .into_iter()
                .map(|key| key.to_ascii_lowercase())
                .collect(),
            groups: HashMap::new(),
            matches: HashMap::new(),
            matched_groups: HashSet::new(),
            awaiting_import: HashSet::new(),
            observed: 0,
        }
    }

    /// Whether every pending torrent has been matched and no matched group
    /// is still a grab waiting for an import of the same release.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty() && self.awaiting_import.is_empty()
    }

    /// Fold one history event in.
    ///
    /// Returns [`ControlFlow::Break`] once nothing is left to match and no
    /// matched group can still change when the history is read newest first.
    pub fn observe(&mut self, event: &HistoryEvent) -> ControlFlow<()> {
        if !event.is_from(self.family) {
            return self.flow();
        }
        self.observed += 1;

        self.groups.entry(event.group_key).or_default().record(event);

        if let Some(key) = event.correlation_key()
            && self.pending.remove(&key)
        {
            trace!(download_id = %key, group = %event.group_key, "matched history event");
            self.matches.insert(
                key,
                Match {
                    group: event.group_key,
                    download_id: event.download_id.clone().unwrap_or_default(),
                },
            );
            self.matched_groups.insert(event.group_key);
        }
        if self.matched_groups.contains(&event.group_key) {
            self.track_pending_import(event.group_key);
        }

        self.flow()
    }

    fn track_pending_import(&mut self, group: GroupKey) {
        let grabbed = self
            .groups
            .get(&group)
            .and_then(GroupEvidence::resolve)
            .is_some_and(|record| record.kind == EventKind::Grabbed);
        if grabbed {
            self.awaiting_import.insert(group);
        } else {
            self.awaiting_import.remove(&group);
        }
    }

    fn flow(&self) -> ControlFlow<()> {
        if self.is_settled() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    /// Resolve every match against the final group records.
    #[must_use]
    pub fn finish(self) -> Reconciliation {
        let Self {
            pending,
            groups,
            matches,
            observed,
            ..
        } = self;
        let resolved = matches
            .into_iter()
            .filter_map(|(key, matched)| {
                let status = groups.get(&matched.group)?.resolve()?.kind.status();
                Some((
                    key,
                    Resolution {
                        status,
                        download_client_id: matched.download_id,
                        group: matched.group,
                    },
                ))
            })
            .collect();
        let mut unmatched: Vec<String> = pending.into_iter().collect();
        unmatched.sort_unstable();
        Reconciliation {
            resolved,
            unmatched,
            observed,
        }
    }
}
