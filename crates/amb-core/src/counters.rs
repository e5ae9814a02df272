//! Durable campaign counters.
//!
//! The counter file is a small JSON record (`{"last_check": 3, "dead_chat_pings": 1}`).
//! Every increment is a read-modify-write under a single process-wide lock, and
//! the write goes through a temp file + `sync_all` + rename so a crash never
//! leaves a half-written record behind.

use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{domain::CampaignKind, errors::Error, Result};

/// Named counters kept in the counter file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CounterName {
    LastCheck,
    DeadChatPings,
}

impl CounterName {
    pub fn key(self) -> &'static str {
        match self {
            CounterName::LastCheck => "last_check",
            CounterName::DeadChatPings => "dead_chat_pings",
        }
    }

    pub fn for_kind(kind: CampaignKind) -> Self {
        match kind {
            CampaignKind::ActivityCheck => CounterName::LastCheck,
            CampaignKind::DeadChat => CounterName::DeadChatPings,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    #[serde(default)]
    pub last_check: u64,
    #[serde(default)]
    pub dead_chat_pings: u64,
}

impl CounterRecord {
    pub fn get(&self, name: CounterName) -> u64 {
        match name {
            CounterName::LastCheck => self.last_check,
            CounterName::DeadChatPings => self.dead_chat_pings,
        }
    }

    fn slot(&mut self, name: CounterName) -> &mut u64 {
        match name {
            CounterName::LastCheck => &mut self.last_check,
            CounterName::DeadChatPings => &mut self.dead_chat_pings,
        }
    }
}

/// File-backed counter store. Share it behind an `Arc`.
pub struct CounterStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CounterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the counter file exists and carries every known key.
    ///
    /// Safe to call on every startup. A corrupt file is reported, never reset.
    pub fn initialize(&self) -> Result<CounterRecord> {
        let _guard = self.guard();

        match read_raw(&self.path)? {
            None => {
                let record = CounterRecord::default();
                write_atomic(&self.path, &record)?;
                info!(path = %self.path.display(), "created counter file");
                Ok(record)
            }
            Some(raw) => {
                let record = parse_record(&self.path, &raw)?;
                if !has_all_keys(&raw) {
                    write_atomic(&self.path, &record)?;
                    info!(path = %self.path.display(), "filled missing counter keys");
                }
                Ok(record)
            }
        }
    }

    /// Atomically bump a counter and return its new value.
    ///
    /// The new value is on disk before this returns.
    pub fn increment(&self, name: CounterName) -> Result<u64> {
        let _guard = self.guard();

        let mut record = match read_raw(&self.path)? {
            None => CounterRecord::default(),
            Some(raw) => parse_record(&self.path, &raw)?,
        };

        let slot = record.slot(name);
        *slot = slot.checked_add(1).ok_or_else(|| Error::StorageCorrupt {
            path: self.path.clone(),
            reason: format!("{} overflowed", name.key()),
        })?;
        let value = *slot;

        write_atomic(&self.path, &record)?;
        debug!(counter = name.key(), value, "counter incremented");
        Ok(value)
    }

    /// [`increment`](Self::increment) on the blocking pool, for async callers.
    ///
    /// The file lock and fsync never stall a runtime worker while another
    /// launch holds the store.
    pub async fn allocate(self: Arc<Self>, name: CounterName) -> Result<u64> {
        tokio::task::spawn_blocking(move || self.increment(name))
            .await
            .map_err(|e| Error::External(format!("counter task failed: {e}")))?
    }

    pub fn snapshot(&self) -> Result<CounterRecord> {
        let _guard = self.guard();
        match read_raw(&self.path)? {
            None => Ok(CounterRecord::default()),
            Some(raw) => parse_record(&self.path, &raw),
        }
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        // The guarded data is `()`, so a poisoned lock carries no broken state.
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn read_raw(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(txt) => Ok(Some(txt)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::StorageCorrupt {
            path: path.to_path_buf(),
            reason: format!("unreadable: {e}"),
        }),
    }
}

fn parse_record(path: &Path, raw: &str) -> Result<CounterRecord> {
    serde_json::from_str(raw).map_err(|e| Error::StorageCorrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn has_all_keys(raw: &str) -> bool {
    let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(raw) else {
        return false;
    };
    [CounterName::LastCheck, CounterName::DeadChatPings]
        .iter()
        .all(|n| map.contains_key(n.key()))
}

fn write_atomic(path: &Path, record: &CounterRecord) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let data = serde_json::to_vec(record)?;
    let tmp = path.with_extension("json.tmp");
    {
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)?;
        f.write_all(&data)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    sync_parent(path)?;
    Ok(())
}

// Persist the rename itself; otherwise a power cut can bring back the old record.
#[cfg(unix)]
fn sync_parent(path: &Path) -> Result<()> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(p) => p,
        None => Path::new("."),
    };
    fs::File::open(parent)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> Result<()> {
    Ok(())
}
