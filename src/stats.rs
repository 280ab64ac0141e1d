use crate::config::{ConfigChange, ConfigKey, PracticeConfig};
use crate::error::{PracticeError, Result};
use crate::events::{EventBus, PracticeEvent};
use crate::runtime::FlushScheduler;
use crate::storage::{StatsBackend, StatsSnapshot};
use crate::util;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything recorded about one word.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordRecord {
    /// Burst speeds in the order they were typed.
    pub speeds: Vec<f64>,
    #[serde(default)]
    pub missed_count: u32,
}

/// Per-word figures for an info panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordSummary {
    pub word: String,
    pub typed: usize,
    pub missed: u32,
    pub worst: f64,
    pub mean: f64,
    pub median: f64,
    pub best: f64,
}

/// In-memory word records and the speed queries over them.
///
/// Every query answers 0 (or "not cleared") for a word with no samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordStats {
    words: BTreeMap<String, WordRecord>,
}

impl WordStats {
    pub fn from_records(words: BTreeMap<String, WordRecord>) -> Self {
        Self { words }
    }

    pub fn records(&self) -> &BTreeMap<String, WordRecord> {
        &self.words
    }

    pub fn record(&self, word: &str) -> WordRecord {
        self.words.get(word).cloned().unwrap_or_default()
    }

    pub fn speeds(&self, word: &str) -> &[f64] {
        self.words
            .get(word)
            .map(|r| r.speeds.as_slice())
            .unwrap_or_default()
    }

    /// Returns false when the sample was dropped.
    pub fn append_speed(&mut self, word: &str, speed: f64) -> bool {
        if word.is_empty() {
            return false;
        }
        if !speed.is_finite() {
            warn!(word, speed, "dropping non-finite burst speed");
            return false;
        }
        self.words
            .entry(word.to_string())
            .or_default()
            .speeds
            .push(speed);
        true
    }

    pub fn add_misses(&mut self, word: &str, count: u32) {
        let record = self.words.entry(word.to_string()).or_default();
        record.missed_count = record.missed_count.saturating_add(count);
    }

    pub fn reset(&mut self, word: &str) {
        self.words.insert(word.to_string(), WordRecord::default());
    }

    pub fn median_speed(&self, word: &str) -> f64 {
        util::median(self.speeds(word)).unwrap_or(0.0)
    }

    /// Exact mean, for comparisons.
    pub fn mean_speed(&self, word: &str) -> f64 {
        util::mean(self.speeds(word)).unwrap_or(0.0)
    }

    /// Mean rounded to the nearest whole speed, for display.
    pub fn display_mean_speed(&self, word: &str) -> f64 {
        self.mean_speed(word).round()
    }

    pub fn min_speed(&self, word: &str) -> f64 {
        util::min(self.speeds(word)).unwrap_or(0.0)
    }

    pub fn max_speed(&self, word: &str) -> f64 {
        util::max(self.speeds(word)).unwrap_or(0.0)
    }

    pub fn missed_count(&self, word: &str) -> u32 {
        self.words.get(word).map(|r| r.missed_count).unwrap_or(0)
    }

    pub fn typed_count(&self, word: &str) -> usize {
        self.speeds(word).len()
    }

    /// Whether the median burst speed is strictly above `threshold`.
    pub fn has_cleared_speed(&self, word: &str, threshold: u32) -> bool {
        let speeds = self.speeds(word);
        !speeds.is_empty() && self.median_speed(word) > f64::from(threshold)
    }

    pub fn summary(&self, word: &str) -> WordSummary {
        WordSummary {
            word: word.to_string(),
            typed: self.typed_count(word),
            missed: self.missed_count(word),
            worst: self.min_speed(word),
            mean: self.display_mean_speed(word),
            median: self.median_speed(word),
            best: self.max_speed(word),
        }
    }
}

/// Word records and config backed by a [`StatsBackend`].
///
/// Reads are served from memory. Writes mark the store dirty and reach the
/// backend either on the next due [`flush_if_due`](Self::flush_if_due) or
/// immediately through [`flush_now`](Self::flush_now). A store that is
/// dropped while dirty flushes itself.
pub struct WordStatsStore<B: StatsBackend> {
    stats: WordStats,
    config: BTreeMap<String, String>,
    backend: B,
    scheduler: FlushScheduler,
}

impl<B: StatsBackend> WordStatsStore<B> {
    pub fn open(backend: B) -> Result<Self> {
        Self::open_with_scheduler(backend, FlushScheduler::default())
    }

    pub fn open_with_scheduler(mut backend: B, scheduler: FlushScheduler) -> Result<Self> {
        let snapshot = backend.load()?;
        debug!(
            words = snapshot.words.len(),
            config = snapshot.config.len(),
            "loaded stats"
        );
        Ok(Self {
            stats: WordStats::from_records(snapshot.words),
            config: snapshot.config,
            backend,
            scheduler,
        })
    }

    pub fn stats(&self) -> &WordStats {
        &self.stats
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn get_record(&self, word: &str) -> WordRecord {
        self.stats.record(word)
    }

    pub fn append_speed(&mut self, word: &str, speed: f64, bus: &mut EventBus) {
        if self.stats.append_speed(word, speed) {
            self.touched(word, bus);
        }
    }

    pub fn add_misses(&mut self, word: &str, count: u32, bus: &mut EventBus) {
        self.stats.add_misses(word, count);
        self.touched(word, bus);
    }

    fn touched(&mut self, word: &str, bus: &mut EventBus) {
        self.scheduler.mark_dirty();
        bus.emit(PracticeEvent::WordUpdated {
            word: word.to_string(),
            record: self.stats.record(word),
        });
    }

    pub fn reset_word(&mut self, word: &str, bus: &mut EventBus) {
        self.stats.reset(word);
        self.scheduler.mark_dirty();
        bus.emit(PracticeEvent::WordReset {
            word: word.to_string(),
        });
    }

    /// Resets every word, then sends a single batch notification.
    pub fn reset_words(&mut self, words: &[String], bus: &mut EventBus) {
        for word in words {
            self.stats.reset(word);
        }
        self.scheduler.mark_dirty();
        bus.emit(PracticeEvent::WordsReset {
            words: words.to_vec(),
        });
    }

    pub fn has_cleared_speed(&self, word: &str, threshold: u32) -> bool {
        self.stats.has_cleared_speed(word, threshold)
    }

    pub fn median_speed(&self, word: &str) -> f64 {
        self.stats.median_speed(word)
    }

    pub fn mean_speed(&self, word: &str) -> f64 {
        self.stats.display_mean_speed(word)
    }

    pub fn min_speed(&self, word: &str) -> f64 {
        self.stats.min_speed(word)
    }

    pub fn max_speed(&self, word: &str) -> f64 {
        self.stats.max_speed(word)
    }

    pub fn miss_count_of(&self, word: &str) -> u32 {
        self.stats.missed_count(word)
    }

    pub fn typed_count_of(&self, word: &str) -> usize {
        self.stats.typed_count(word)
    }

    pub fn summary(&self, word: &str) -> WordSummary {
        self.stats.summary(word)
    }

    pub fn config(&self) -> PracticeConfig<'_> {
        PracticeConfig::new(&self.config)
    }

    pub fn config_value(&self, key: &str) -> Option<&str> {
        self.config.get(key).map(String::as_str)
    }

    /// Validates recognised keys, stores the value and reports the change.
    ///
    /// Returns `Ok(None)` when the value was already set.
    pub fn set_config(
        &mut self,
        key: &str,
        value: &str,
        bus: &mut EventBus,
    ) -> Result<Option<ConfigChange>> {
        if let Some(known) = ConfigKey::from_name(key) {
            known.validate(value)?;
        }
        Ok(self.set_config_unchecked(key, value, bus))
    }

    /// Stores a value without validation. Used for engine-driven escalation.
    pub(crate) fn set_config_unchecked(
        &mut self,
        key: &str,
        value: &str,
        bus: &mut EventBus,
    ) -> Option<ConfigChange> {
        let original = self.config.get(key).cloned().unwrap_or_default();
        if original == value {
            return None;
        }
        self.config.insert(key.to_string(), value.to_string());
        self.scheduler.mark_dirty();

        let change = ConfigChange {
            key: key.to_string(),
            original,
            new_value: value.to_string(),
        };
        bus.emit(PracticeEvent::ConfigKeyChanged(change.clone()));
        Some(change)
    }

    pub fn export_all(&self) -> StatsSnapshot {
        StatsSnapshot {
            words: self.stats.records().clone(),
            config: self.config.clone(),
        }
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export_all())?)
    }

    /// Replaces all records and config with an exported document.
    ///
    /// The document must be an object holding a `words` map and a `config`
    /// map; otherwise nothing changes.
    pub fn import_all(&mut self, blob: &str) -> Result<()> {
        let value: serde_json::Value = serde_json::from_str(blob)
            .map_err(|e| PracticeError::malformed(format!("not JSON: {e}")))?;
        let object = value
            .as_object()
            .ok_or_else(|| PracticeError::malformed("expected a JSON object"))?;
        for field in ["words", "config"] {
            match object.get(field) {
                Some(v) if v.is_object() => {}
                Some(_) => return Err(PracticeError::malformed(format!("'{field}' must be a map"))),
                None => return Err(PracticeError::malformed(format!("missing '{field}'"))),
            }
        }
        let snapshot: StatsSnapshot =
            serde_json::from_value(value).map_err(|e| PracticeError::malformed(e.to_string()))?;

        self.import_snapshot(snapshot)
    }

    /// Replaces all records and config; recognised config values must pass
    /// the same checks as [`set_config`](Self::set_config).
    pub fn import_snapshot(&mut self, snapshot: StatsSnapshot) -> Result<()> {
        for (key, value) in &snapshot.config {
            if let Some(known) = ConfigKey::from_name(key) {
                known.validate(value)?;
            }
        }

        info!(words = snapshot.words.len(), "importing stats");
        self.stats = WordStats::from_records(snapshot.words);
        self.config = snapshot.config;
        self.scheduler.mark_dirty();
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.scheduler.is_dirty()
    }

    pub fn flush_now(&mut self) -> Result<()> {
        self.backend.save(&self.export_all())?;
        self.scheduler.clear();
        Ok(())
    }

    pub fn flush_if_due(&mut self) -> Result<bool> {
        self.flush_if_due_at(Instant::now())
    }

    /// Writes if the quiet interval has passed since the last mutation.
    pub fn flush_if_due_at(&mut self, now: Instant) -> Result<bool> {
        if !self.scheduler.is_due_at(now) {
            return Ok(false);
        }
        self.flush_now()?;
        Ok(true)
    }
}

impl<B: StatsBackend> Drop for WordStatsStore<B> {
    fn drop(&mut self) {
        if self.scheduler.is_dirty() {
            if let Err(e) = self.flush_now() {
                warn!(error = %e, "failed to flush stats on drop");
            }
        }
    }
}

impl<B: StatsBackend> std::fmt::Debug for WordStatsStore<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordStatsStore")
            .field("words", &self.stats.records().len())
            .field("config", &self.config)
            .field("dirty", &self.scheduler.is_dirty())
            .finish()
    }
}
