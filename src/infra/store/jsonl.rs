//! File-backed state store using JSON-lines journals.
//!
//! Each table is an append-only journal (`bookings.jsonl`, `events.jsonl`,
//! `outreach.jsonl`). A put appends the full record, a delete appends a
//! tombstone; loading replays the journal and the last entry per key wins.

use std::collections::HashMap;
use std::fs::{create_dir_all, OpenOptions};
use std::hash::Hash;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::{Booking, OutreachRecord, PlanningEvent, SchedulingError, StateStore};
use crate::util::serde::{BookingId, EventId};

const BOOKINGS: &str = "bookings";
const EVENTS: &str = "events";
const OUTREACH: &str = "outreach";

#[derive(Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum JournalEntry<K, V> {
    Put { value: V },
    Delete { key: K },
}

fn backend(err: impl std::fmt::Display) -> SchedulingError {
    SchedulingError::Backend(err.to_string())
}

/// Durable store writing JSON lines under one directory.
pub struct JsonlStore {
    path: PathBuf,
    // Serializes appends so lines from concurrent writers never interleave.
    write_lock: Mutex<()>,
}

impl JsonlStore {
    /// Open (creating if needed) a store rooted at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SchedulingError> {
        let path = path.as_ref().to_path_buf();
        create_dir_all(&path).map_err(backend)?;
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Directory holding the journals.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_path(&self, table: &str) -> PathBuf {
        self.path.join(format!("{table}.jsonl"))
    }

    fn append<K: Serialize, V: Serialize>(
        &self,
        table: &str,
        entry: &JournalEntry<K, V>,
    ) -> Result<(), SchedulingError> {
        let line = serde_json::to_string(entry).map_err(backend)?;
        let _guard = self.write_lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_path(table))
            .map_err(backend)?;
        writeln!(file, "{line}").map_err(backend)?;
        file.flush().map_err(backend)
    }

    fn replay<K, V>(
        &self,
        table: &str,
        key_of: impl Fn(&V) -> K,
    ) -> Result<Vec<V>, SchedulingError>
    where
        K: Eq + Hash + DeserializeOwned,
        V: DeserializeOwned,
    {
        let file_path = self.file_path(table);
        if !file_path.exists() {
            return Ok(Vec::new());
        }
        let _guard = self.write_lock.lock();
        let file = OpenOptions::new()
            .read(true)
            .open(&file_path)
            .map_err(backend)?;
        let mut order: Vec<K> = Vec::new();
        let mut latest: HashMap<K, V> = HashMap::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(backend)?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: JournalEntry<K, V> = serde_json::from_str(&line).map_err(|e| {
                SchedulingError::Backend(format!("{table}.jsonl line {}: {e}", number + 1))
            })?;
            match entry {
                JournalEntry::Put { value } => {
                    let key = key_of(&value);
                    if !latest.contains_key(&key) {
                        order.push(key_of(&value));
                    }
                    latest.insert(key, value);
                }
                JournalEntry::Delete { key } => {
                    latest.remove(&key);
                }
            }
        }
        let mut out = Vec::with_capacity(latest.len());
        for key in order {
            if let Some(value) = latest.remove(&key) {
                out.push(value);
            }
        }
        tracing::debug!(table, records = out.len(), "journal replayed");
        Ok(out)
    }

    /// Rewrite every journal with only its live records.
    pub fn compact(&self) -> Result<(), SchedulingError> {
        let bookings = self.load_bookings()?;
        let events = self.load_events()?;
        let outreach = self.load_outreach()?;
        self.rewrite::<BookingId, _>(BOOKINGS, bookings)?;
        self.rewrite::<EventId, _>(EVENTS, events)?;
        self.rewrite::<BookingId, _>(OUTREACH, outreach)?;
        tracing::info!(path = %self.path.display(), "journals compacted");
        Ok(())
    }

    fn rewrite<K: Serialize, V: Serialize>(
        &self,
        table: &str,
        values: Vec<V>,
    ) -> Result<(), SchedulingError> {
        let _guard = self.write_lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(self.file_path(table))
            .map_err(backend)?;
        for value in values {
            let line =
                serde_json::to_string(&JournalEntry::<K, V>::Put { value }).map_err(backend)?;
            writeln!(file, "{line}").map_err(backend)?;
        }
        file.flush().map_err(backend)
    }
}

impl StateStore for JsonlStore {
    fn put_booking(&self, booking: &Booking) -> Result<(), SchedulingError> {
        self.append::<BookingId, _>(BOOKINGS, &JournalEntry::Put { value: booking })
    }

    fn delete_booking(&self, id: BookingId) -> Result<(), SchedulingError> {
        self.append::<_, Booking>(BOOKINGS, &JournalEntry::Delete { key: id })
    }

    fn load_bookings(&self) -> Result<Vec<Booking>, SchedulingError> {
        self.replay(BOOKINGS, |b: &Booking| b.id)
    }

    fn put_event(&self, event: &PlanningEvent) -> Result<(), SchedulingError> {
        self.append::<EventId, _>(EVENTS, &JournalEntry::Put { value: event })
    }

    fn delete_event(&self, id: &str) -> Result<(), SchedulingError> {
        self.append::<_, PlanningEvent>(EVENTS, &JournalEntry::Delete { key: id })
    }

    fn load_events(&self) -> Result<Vec<PlanningEvent>, SchedulingError> {
        self.replay(EVENTS, |e: &PlanningEvent| e.id.clone())
    }

    fn put_outreach(&self, record: &OutreachRecord) -> Result<(), SchedulingError> {
        self.append::<BookingId, _>(OUTREACH, &JournalEntry::Put { value: record })
    }

    fn delete_outreach(&self, booking_id: BookingId) -> Result<(), SchedulingError> {
        self.append::<_, OutreachRecord>(OUTREACH, &JournalEntry::Delete { key: booking_id })
    }

    fn load_outreach(&self) -> Result<Vec<OutreachRecord>, SchedulingError> {
        self.replay(OUTREACH, |r: &OutreachRecord| r.booking_id)
    }
}
