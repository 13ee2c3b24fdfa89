//! Market Tracker Store - Atomic JSON Resolution Record
//!
//! Persists the resolved-market set to `tracker.json` using atomic
//! writes (write to tmp file, then rename). The file is always either
//! the old or the new version, never a partial write — which is what
//! the at-most-once settlement guarantee rests on across restarts.
//!
//! An unreadable or unparsable store fails `open` so the caller can
//! abort startup: running without a trustworthy dedup record risks
//! double settlement.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::domain::outcome::Outcome;
use crate::ports::repository::{TrackedMarket, TrackerRepository};

/// Durable tracker over an atomic JSON document.
#[derive(Debug)]
pub struct MarketTrackerStore {
    /// Path to tracker.json.
    tracker_path: PathBuf,
    /// Temporary path for atomic writes.
    tmp_path: PathBuf,
    /// In-memory view, authoritative between writes. The lock also
    /// serializes the write path so two concurrent records for the
    /// same market cannot interleave into a corrupt file.
    records: RwLock<HashMap<String, TrackedMarket>>,
}

impl MarketTrackerStore {
    /// Open (or create) the tracker in the given data directory.
    ///
    /// Loads the full persisted set before returning. Errors here
    /// must abort startup — see module docs.
    pub async fn open(data_dir: &str) -> Result<Self> {
        let dir = Path::new(data_dir);
        fs::create_dir_all(dir)
            .await
            .context("Failed to create data directory")?;

        let tracker_path = dir.join("tracker.json");
        let tmp_path = dir.join("tracker.json.tmp");

        let records = if tracker_path.exists() {
            let json = fs::read_to_string(&tracker_path)
                .await
                .context("Failed to read tracker file")?;
            let map: HashMap<String, TrackedMarket> =
                serde_json::from_str(&json).context("Failed to parse tracker JSON")?;
            info!(
                path = %tracker_path.display(),
                resolved = map.values().filter(|m| m.resolved).count(),
                tracked = map.len(),
                "Tracker loaded"
            );
            map
        } else {
            info!(path = %tracker_path.display(), "No tracker file found, starting fresh");
            HashMap::new()
        };

        Ok(Self {
            tracker_path,
            tmp_path,
            records: RwLock::new(records),
        })
    }

    /// Write the full map atomically (tmp → rename).
    async fn persist(&self, records: &HashMap<String, TrackedMarket>) -> Result<()> {
        let json = serde_json::to_string_pretty(records)
            .context("Failed to serialize tracker")?;

        fs::write(&self.tmp_path, &json)
            .await
            .context("Failed to write tmp tracker file")?;

        fs::rename(&self.tmp_path, &self.tracker_path)
            .await
            .context("Failed to rename tracker file")?;

        Ok(())
    }
}

#[async_trait]
impl TrackerRepository for MarketTrackerStore {
    async fn load_all(&self) -> Result<Vec<TrackedMarket>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn is_resolved(&self, market_id: &str) -> Result<bool> {
        Ok(self
            .records
            .read()
            .await
            .get(market_id)
            .is_some_and(|m| m.resolved))
    }

    #[instrument(skip(self))]
    async fn record_resolved(&self, market_id: &str, outcome: Outcome) -> Result<()> {
        let mut records = self.records.write().await;

        records.insert(
            market_id.to_string(),
            TrackedMarket {
                market_id: market_id.to_string(),
                resolved: true,
                resolved_outcome: Some(outcome.settlement_value()),
                resolved_at: Some(Utc::now()),
            },
        );

        // Persist before releasing the lock: the next poll cycle must
        // observe this resolution even across a crash.
        self.persist(&records).await?;

        info!(
            market_id,
            outcome = %outcome,
            path = %self.tracker_path.display(),
            "Resolution recorded"
        );

        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        if !self.tracker_path.exists() {
            return true; // First run is OK
        }
        fs::metadata(&self.tracker_path).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use uuid::Uuid;

    fn temp_dir() -> String {
        std::env::temp_dir()
            .join(format!("tracker-test-{}", Uuid::new_v4()))
            .to_string_lossy()
            .into_owned()
    }

    #[tokio::test]
    async fn test_fresh_store_is_empty() {
        let dir = temp_dir();
        let store = MarketTrackerStore::open(&dir).await.unwrap();
        assert!(store.load_all().await.unwrap().is_empty());
        assert!(!store.is_resolved("m1").await.unwrap());
    }

    #[tokio::test]
    async fn test_record_survives_reopen() {
        let dir = temp_dir();

        {
            let store = MarketTrackerStore::open(&dir).await.unwrap();
            store.record_resolved("m1", Outcome::Yes).await.unwrap();
            store.record_resolved("m2", Outcome::No).await.unwrap();
        }

        // Simulated restart: reload from disk.
        let store = MarketTrackerStore::open(&dir).await.unwrap();
        assert!(store.is_resolved("m1").await.unwrap());
        assert!(store.is_resolved("m2").await.unwrap());

        let all = store.load_all().await.unwrap();
        assert_eq!(all.len(), 2);
        let m1 = all.iter().find(|m| m.market_id == "m1").unwrap();
        assert_eq!(m1.resolved_outcome, Some(1));
        assert!(m1.resolved_at.is_some());
    }

    #[tokio::test]
    async fn test_corrupt_file_fails_open() {
        let dir = temp_dir();
        fs::create_dir_all(&dir).await.unwrap();
        fs::write(Path::new(&dir).join("tracker.json"), "{not json")
            .await
            .unwrap();

        let err = MarketTrackerStore::open(&dir).await.unwrap_err();
        assert!(err.to_string().contains("parse"));
    }

    #[tokio::test]
    async fn test_re_record_is_idempotent() {
        let dir = temp_dir();
        let store = MarketTrackerStore::open(&dir).await.unwrap();

        store.record_resolved("m1", Outcome::Yes).await.unwrap();
        store.record_resolved("m1", Outcome::Yes).await.unwrap();

        let all = store.load_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].resolved);
    }

    #[tokio::test]
    async fn test_no_tmp_file_left_behind() {
        let dir = temp_dir();
        let store = MarketTrackerStore::open(&dir).await.unwrap();
        store.record_resolved("m1", Outcome::No).await.unwrap();

        assert!(!Path::new(&dir).join("tracker.json.tmp").exists());
        assert!(Path::new(&dir).join("tracker.json").exists());
    }
}
