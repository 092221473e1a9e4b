//! Per-resource interval index over booked time windows.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::core::TimeWindow;
use crate::util::serde::{BookingId, ResourceId};

/// Ordering key of the per-resource index: date, then start minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct SlotKey {
    date: NaiveDate,
    start: u32,
    id: BookingId,
}

/// Booked windows indexed by resource and ordered by start time.
///
/// The store is a plain data structure; callers that share it across threads
/// wrap it in a lock (see `BookingLedger`).
#[derive(Debug, Default)]
pub struct IntervalStore {
    /// Resource -> (date, start, id) -> exclusive end minute.
    lanes: HashMap<ResourceId, BTreeMap<SlotKey, u32>>,
    /// Reverse lookup for removal by id.
    entries: HashMap<BookingId, (ResourceId, TimeWindow)>,
}

impl IntervalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `window` on `resource` under `id`, replacing any prior entry for `id`.
    pub fn insert(&mut self, resource: &str, window: TimeWindow, id: BookingId) {
        self.remove(id);
        let key = SlotKey {
            date: window.date,
            start: window.start_minute(),
            id,
        };
        self.lanes
            .entry(resource.to_string())
            .or_default()
            .insert(key, window.end_minute());
        self.entries.insert(id, (resource.to_string(), window));
    }

    /// Drop `id` from the index, returning where it was booked.
    pub fn remove(&mut self, id: BookingId) -> Option<(ResourceId, TimeWindow)> {
        let (resource, window) = self.entries.remove(&id)?;
        if let Some(lane) = self.lanes.get_mut(&resource) {
            lane.remove(&SlotKey {
                date: window.date,
                start: window.start_minute(),
                id,
            });
            if lane.is_empty() {
                self.lanes.remove(&resource);
            }
        }
        Some((resource, window))
    }

    /// Ids of every booking on `resource` whose window overlaps `window`.
    ///
    /// Walks only the entries of the same date that start before the end of
    /// `window`, then keeps those ending after its start.
    pub fn overlapping(&self, resource: &str, window: &TimeWindow) -> BTreeSet<BookingId> {
        let Some(lane) = self.lanes.get(resource) else {
            return BTreeSet::new();
        };
        let from = SlotKey {
            date: window.date,
            start: 0,
            id: BookingId::nil(),
        };
        let to = SlotKey {
            date: window.date,
            start: window.end_minute(),
            id: BookingId::nil(),
        };
        let start = window.start_minute();
        lane.range(from..to)
            .filter(|(_, end)| **end > start)
            .map(|(key, _)| key.id)
            .collect()
    }

    /// Where `id` is booked, if indexed.
    pub fn get(&self, id: BookingId) -> Option<&(ResourceId, TimeWindow)> {
        self.entries.get(&id)
    }

    /// Whether `id` is indexed.
    pub fn contains(&self, id: BookingId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Windows booked on `resource` for `date`, in start order.
    pub fn day(&self, resource: &str, date: NaiveDate) -> Vec<(BookingId, TimeWindow)> {
        let Some(lane) = self.lanes.get(resource) else {
            return Vec::new();
        };
        let from = SlotKey {
            date,
            start: 0,
            id: BookingId::nil(),
        };
        lane.range(from..)
            .take_while(|(key, _)| key.date == date)
            .filter_map(|(key, _)| self.entries.get(&key.id).map(|(_, w)| (key.id, *w)))
            .collect()
    }

    /// Number of indexed bookings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
