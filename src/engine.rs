use crate::config::{ConfigKey, PracticeConfig};
use crate::error::Result;
use crate::events::{EventBus, Outbox, PracticeEvent, UiHandle};
use crate::group::{GroupRegistry, PracticeGroup, THRESHOLD_STEP};
use crate::stats::WordStatsStore;
use crate::storage::StatsBackend;
use crate::wordset::Wordset;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Amount the target speed rises when every word has been mastered.
pub const TARGET_SPEED_STEP: u32 = THRESHOLD_STEP;

/// Re-rolls allowed before picking a different word outright.
const MAX_REROLLS: usize = 64;

/// A completed test, as reported by the test runner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
    /// Words typed, in order.
    pub history: Vec<String>,
    /// Burst speed for each entry of `history`.
    pub burst_speeds: Vec<f64>,
    #[serde(default)]
    pub missed_words: BTreeMap<String, u32>,
    #[serde(default)]
    pub difficulty_failed: bool,
}

/// A single word finished during a test.
#[derive(Debug, Clone, PartialEq)]
pub struct WordTyped {
    pub word: String,
    pub correct: bool,
    pub burst: f64,
    pub handle: UiHandle,
}

/// Words beaten at the target speed out of a total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub beaten: usize,
    pub total: usize,
}

impl Progress {
    /// 0 for an empty set.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.beaten as f64 / self.total as f64 * 100.0
        }
    }
}

/// Display flags for one word.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WordStatus {
    pub typed: bool,
    pub beaten_at_group: bool,
    pub beaten_at_target: bool,
    /// Median speed as a fraction of the target, capped at 1.
    pub completion: f64,
}

/// Decides which word to serve next and keeps practice groups current.
///
/// The engine is inactive until it has seen a word list. From then on every
/// change to the list, to `targetSpeed`/`groupSize`, or to the recorded
/// mastery data rebuilds the groups. Dropping the engine discards the groups;
/// only the store's data is durable.
pub struct AdaptiveEngine<B: StatsBackend> {
    store: WordStatsStore<B>,
    registry: GroupRegistry,
    bus: EventBus,
    word_list: Wordset,
    current: Option<usize>,
    last_served: Option<String>,
    rng: StdRng,
}

impl<B: StatsBackend> AdaptiveEngine<B> {
    pub fn new(store: WordStatsStore<B>) -> Self {
        Self::with_rng(store, StdRng::from_entropy())
    }

    pub fn with_seed(store: WordStatsStore<B>, seed: u64) -> Self {
        Self::with_rng(store, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(store: WordStatsStore<B>, rng: StdRng) -> Self {
        Self {
            store,
            registry: GroupRegistry::new(),
            bus: EventBus::new(),
            word_list: Wordset::default(),
            current: None,
            last_served: None,
            rng,
        }
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&PracticeEvent, &mut Outbox) + 'static,
    {
        self.bus.subscribe(listener);
    }

    /// Tell listeners the starting configuration.
    pub fn announce_config(&mut self) {
        let config = self.store.config();
        let event = PracticeEvent::ConfigInitialized {
            sorter: config.sorter(),
            target_speed: config.target_speed(),
            group_size: config.group_size(),
        };
        self.bus.emit(event);
    }

    pub fn store(&self) -> &WordStatsStore<B> {
        &self.store
    }

    pub fn config(&self) -> PracticeConfig<'_> {
        self.store.config()
    }

    pub fn target_speed(&self) -> u32 {
        self.store.config().target_speed()
    }

    pub fn word_list(&self) -> &Wordset {
        &self.word_list
    }

    pub fn groups(&self) -> &[PracticeGroup] {
        self.registry.groups()
    }

    pub fn current_group(&self) -> Option<&PracticeGroup> {
        self.current.and_then(|i| self.registry.get(i))
    }

    pub fn current_position(&self) -> Option<usize> {
        self.current
    }

    /// Adopt `list` if it differs from the active word list.
    ///
    /// Returns whether the groups were rebuilt.
    pub fn on_word_list_observed(&mut self, list: &[String]) -> bool {
        if self.word_list.words() == list {
            return false;
        }
        self.adopt_new_word_list(Wordset::new(list.to_vec()));
        true
    }

    pub fn adopt_new_word_list(&mut self, list: Wordset) {
        debug!(words = list.len(), "adopting word list");
        self.word_list = list;
        self.last_served = None;
        self.regenerate_groups();
    }

    /// Rebuild groups from the words not yet mastered at the target speed.
    ///
    /// When every word is already mastered the target speed jumps to the
    /// first step at or above the slowest median, so some word is unmastered
    /// again. An empty list just yields no groups.
    fn regenerate_groups(&mut self) {
        let unique = self.word_list.unique_words();
        let mut pending = self.unmastered(&unique);

        if pending.is_empty() && !unique.is_empty() {
            self.raise_target_past_slowest(&unique);
            pending = self.unmastered(&unique);
            if pending.is_empty() {
                warn!(target = self.target_speed(), "target speed maxed out; no groups");
            }
        }

        let group_size = self.store.config().group_size();
        self.registry
            .regenerate(pending, group_size, &mut self.rng, &mut self.bus);
        self.current = self
            .registry
            .first_incomplete_index(self.store.stats(), self.target_speed());
    }

    fn unmastered(&self, words: &[String]) -> Vec<String> {
        let target = self.target_speed();
        words
            .iter()
            .filter(|word| !self.store.has_cleared_speed(word, target))
            .cloned()
            .collect()
    }

    fn raise_target_past_slowest(&mut self, words: &[String]) {
        let target = f64::from(self.target_speed());
        let step = f64::from(TARGET_SPEED_STEP);
        let slowest = words
            .iter()
            .map(|word| self.store.median_speed(word))
            .fold(f64::INFINITY, f64::min);
        let steps = ((slowest - target) / step).ceil().max(1.0);
        let raised = target + steps * step;

        self.set_target_speed_unchecked(if raised >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            raised as u32
        });
    }

    fn escalate_target_speed(&mut self) {
        let raised = self.target_speed().saturating_add(TARGET_SPEED_STEP);
        self.set_target_speed_unchecked(raised);
    }

    /// Store a new target speed without user confirmation or range checks.
    fn set_target_speed_unchecked(&mut self, raised: u32) {
        info!(target_speed = raised, "every word mastered; raising target speed");
        self.store.set_config_unchecked(
            &ConfigKey::TargetSpeed.to_string(),
            &raised.to_string(),
            &mut self.bus,
        );
    }

    /// Serve the next word to type from `list`.
    ///
    /// With probability `unbeatenWordPercentage`% the word comes from the
    /// current group's unbeaten words, otherwise from the whole group. The
    /// same word is never served twice in a row unless it is the only one.
    /// Returns `None` only for an empty list.
    pub fn next_word(&mut self, list: &[String]) -> Option<String> {
        self.on_word_list_observed(list);

        let (pool, unbeaten) = match self.current_group() {
            Some(group) => (
                group.wordset().clone(),
                group.unbeaten_wordset(self.store.stats()),
            ),
            None => (
                Wordset::new(self.word_list.unique_words()),
                Wordset::default(),
            ),
        };
        if pool.is_empty() {
            return None;
        }

        let percentage = self.store.config().unbeaten_word_percentage();
        let can_avoid_repeat = pool.len() > 1;

        let mut chosen = None;
        for _ in 0..=MAX_REROLLS {
            let from_unbeaten = self.rng.gen_range(0..100) < percentage && !unbeaten.is_empty();
            let source = if from_unbeaten { &unbeaten } else { &pool };
            let Some(word) = source.random_word(&mut self.rng) else {
                continue;
            };
            if !can_avoid_repeat || self.last_served.as_deref() != Some(word) {
                chosen = Some(word.to_string());
                break;
            }
        }

        let word = match chosen {
            Some(word) => word,
            None => {
                let others: Vec<&String> = pool
                    .words()
                    .iter()
                    .filter(|w| self.last_served.as_deref() != Some(w.as_str()))
                    .collect();
                others.choose(&mut self.rng).map(|w| w.to_string())?
            }
        };

        self.last_served = Some(word.clone());
        Some(word)
    }

    /// React to one finished word with an animation notification.
    ///
    /// Incorrect words are ignored, as is everything while animations are
    /// switched off.
    pub fn on_word_typed(&mut self, typed: &WordTyped) {
        if !typed.correct || !self.store.config().animations_enabled() {
            return;
        }
        let event = if typed.burst > f64::from(self.target_speed()) {
            PracticeEvent::WordBeaten {
                word: typed.word.clone(),
                burst: typed.burst,
                handle: typed.handle,
            }
        } else {
            PracticeEvent::WordMissed {
                word: typed.word.clone(),
                burst: typed.burst,
                handle: typed.handle,
            }
        };
        self.bus.emit(event);
    }

    /// Record a finished test and move the practice state forward.
    pub fn on_test_completed(&mut self, results: &TestResults) {
        if !results.difficulty_failed {
            if results.history.len() != results.burst_speeds.len() {
                warn!(
                    words = results.history.len(),
                    bursts = results.burst_speeds.len(),
                    "history and burst lengths differ; extra entries ignored"
                );
            }
            for (word, burst) in results.history.iter().zip(&results.burst_speeds) {
                self.store.append_speed(word, *burst, &mut self.bus);
            }
        }
        for (word, count) in &results.missed_words {
            self.store.add_misses(word, *count, &mut self.bus);
        }

        self.refresh_current_group();
        if let Some(i) = self.current {
            if let Some(group) = self.registry.get_mut(i) {
                group.raise_threshold_until_some_words_unbeaten(self.store.stats(), &mut self.bus);
            }
        }

        self.bus.emit(PracticeEvent::ResultsProcessed {
            current_group: self.current_group().cloned(),
            word_list: self.word_list.clone(),
            target_speed: self.target_speed(),
        });
    }

    /// Move to the first incomplete group, rebuilding at a higher target
    /// speed once every group is complete.
    fn refresh_current_group(&mut self) {
        let target = self.target_speed();
        match self.registry.first_incomplete_index(self.store.stats(), target) {
            Some(i) => {
                if self.current != Some(i) {
                    if let Some(group) = self.registry.get(i) {
                        self.bus.emit(PracticeEvent::NextGroupSelected {
                            group: group.clone(),
                            position: i,
                        });
                    }
                }
                self.current = Some(i);
            }
            None if self.registry.is_empty() => self.current = None,
            None => {
                self.escalate_target_speed();
                self.regenerate_groups();
            }
        }
    }

    /// Validate and store a config value, then react to it.
    ///
    /// Returns whether the value changed.
    pub fn set_config(&mut self, key: &str, value: &str) -> Result<bool> {
        match self.store.set_config(key, value, &mut self.bus)? {
            Some(change) => {
                self.on_config_changed(&change.key);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn on_config_changed(&mut self, key: &str) {
        match ConfigKey::from_name(key) {
            Some(ConfigKey::TargetSpeed) | Some(ConfigKey::GroupSize) => self.regenerate_groups(),
            _ => {}
        }
    }

    /// Clear the data of every word in the active list.
    pub fn reset_current_words(&mut self) {
        let words = self.word_list.unique_words();
        self.store.reset_words(&words, &mut self.bus);
        self.regenerate_groups();
    }

    pub fn reset_word(&mut self, word: &str) {
        self.store.reset_word(word, &mut self.bus);
        self.regenerate_groups();
    }

    pub fn export_json(&self) -> Result<String> {
        self.store.export_json()
    }

    /// Replace all stored data; the groups are rebuilt on success.
    pub fn import_all(&mut self, blob: &str) -> Result<()> {
        self.store.import_all(blob)?;
        self.regenerate_groups();
        Ok(())
    }

    pub fn total_progress(&self) -> Progress {
        self.progress_of(self.word_list.words())
    }

    pub fn group_progress(&self) -> Progress {
        match self.current_group() {
            Some(group) => self.progress_of(group.wordset().words()),
            None => Progress { beaten: 0, total: 0 },
        }
    }

    fn progress_of(&self, words: &[String]) -> Progress {
        let target = self.target_speed();
        Progress {
            beaten: words
                .iter()
                .filter(|word| self.store.has_cleared_speed(word, target))
                .count(),
            total: words.len(),
        }
    }

    pub fn word_status(&self, word: &str) -> WordStatus {
        let target = self.target_speed();
        let group_threshold = self.current_group().map(|g| g.threshold()).unwrap_or(1);
        let completion = (self.store.median_speed(word) / f64::from(target)).min(1.0);

        WordStatus {
            typed: self.store.typed_count_of(word) > 0,
            beaten_at_group: self.store.has_cleared_speed(word, group_threshold),
            beaten_at_target: self.store.has_cleared_speed(word, target),
            completion,
        }
    }

    /// The current group's words in the configured presentation order.
    pub fn sorted_current_words(&mut self) -> Vec<String> {
        let words = self
            .current_group()
            .map(|g| g.wordset().words().to_vec())
            .unwrap_or_default();
        self.sorted_words(&words)
    }

    /// `words` in the configured presentation order, shuffled with the
    /// engine's generator for the `random` sorter.
    pub fn sorted_words(&mut self, words: &[String]) -> Vec<String> {
        let mut sorted = words.to_vec();
        let sorter = self.store.config().sorter();
        sorter.sort(&mut sorted, self.store.stats(), &mut self.rng);
        sorted
    }

    pub fn flush_if_due(&mut self) -> Result<bool> {
        self.store.flush_if_due()
    }

    /// Write immediately, e.g. right before the process exits.
    pub fn flush_now(&mut self) -> Result<()> {
        self.store.flush_now()
    }

    /// End the practice session, writing any pending data.
    pub fn deactivate(mut self) -> Result<()> {
        self.store.flush_now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PracticeError;
    use crate::storage::MemoryBackend;
    use assert_matches::assert_matches;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    fn engine() -> AdaptiveEngine<MemoryBackend> {
        let store = WordStatsStore::open(MemoryBackend::new()).unwrap();
        AdaptiveEngine::with_seed(store, 42)
    }

    fn record(engine: &mut AdaptiveEngine<MemoryBackend>, samples: &[(&str, f64)]) {
        engine.on_test_completed(&TestResults {
            history: samples.iter().map(|(w, _)| w.to_string()).collect(),
            burst_speeds: samples.iter().map(|(_, s)| *s).collect(),
            ..TestResults::default()
        });
    }

    fn event_names(engine: &mut AdaptiveEngine<MemoryBackend>) -> Rc<RefCell<Vec<&'static str>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner = Rc::clone(&log);
        engine.subscribe(move |event, _| inner.borrow_mut().push(event.name()));
        log
    }

    #[test]
    fn fresh_list_becomes_one_group() {
        let mut engine = engine();
        assert!(engine.on_word_list_observed(&words(&["cat", "dog", "bird"])));

        assert_eq!(engine.groups().len(), 1);
        let group = engine.current_group().unwrap();
        assert_eq!(group.wordset().len(), 3);
        assert_eq!(group.threshold(), 1);
        assert_eq!(engine.target_speed(), 75);
    }

    #[test]
    fn same_list_is_not_regenerated() {
        let mut engine = engine();
        let list = words(&["cat", "dog"]);
        assert!(engine.on_word_list_observed(&list));
        let log = event_names(&mut engine);

        assert!(!engine.on_word_list_observed(&list));
        assert!(log.borrow().is_empty());

        assert!(engine.on_word_list_observed(&words(&["dog", "cat"])));
        assert!(log.borrow().contains(&"groups-regenerated"));
    }

    #[test]
    fn duplicates_are_grouped_once() {
        let mut engine = engine();
        engine.on_word_list_observed(&words(&["cat", "cat", "dog"]));
        assert_eq!(engine.current_group().unwrap().wordset().len(), 2);
    }

    #[test]
    fn mastered_words_are_filtered_out() {
        let mut engine = engine();
        engine.on_word_list_observed(&words(&["cat", "dog"]));
        record(&mut engine, &[("cat", 100.0)]);

        engine.on_word_list_observed(&words(&["cat", "dog", "bird"]));
        let group = engine.current_group().unwrap();
        assert!(!group.wordset().contains("cat"));
        assert_eq!(group.wordset().len(), 2);
    }

    #[test]
    fn fully_mastered_list_raises_target_speed() {
        let mut engine = engine();
        engine.on_word_list_observed(&words(&["zzz"]));
        record(&mut engine, &[("cat", 80.0), ("cat", 90.0), ("cat", 100.0), ("dog", 100.0)]);

        engine.on_word_list_observed(&words(&["cat", "dog"]));

        assert_eq!(engine.target_speed(), 90);
        assert_eq!(
            engine.current_group().unwrap().wordset(),
            &Wordset::from(&["cat"][..])
        );
    }

    #[test]
    fn target_speed_jumps_in_one_change() {
        let mut engine = engine();
        engine.on_word_list_observed(&words(&["zzz"]));
        record(&mut engine, &[("cat", 1000.0), ("dog", 1200.0)]);
        let log = event_names(&mut engine);

        engine.on_word_list_observed(&words(&["cat", "dog"]));

        assert_eq!(engine.target_speed(), 1000);
        assert_eq!(
            log.borrow().iter().filter(|n| **n == "config-key-changed").count(),
            1
        );
        assert_eq!(
            engine.current_group().unwrap().wordset(),
            &Wordset::from(&["cat"][..])
        );
    }

    #[test]
    fn unreachable_speeds_leave_no_groups_but_still_serve() {
        let mut engine = engine();
        engine.on_word_list_observed(&words(&["zzz"]));
        record(&mut engine, &[("cat", 1.0e10), ("dog", 1.0e10)]);
        let log = event_names(&mut engine);

        let list = words(&["cat", "dog"]);
        engine.on_word_list_observed(&list);

        assert_eq!(engine.target_speed(), u32::MAX);
        assert!(engine.groups().is_empty());
        assert!(engine.current_group().is_none());
        assert_eq!(
            log.borrow().iter().filter(|n| **n == "config-key-changed").count(),
            1
        );

        let mut previous = engine.next_word(&list).unwrap();
        for _ in 0..20 {
            let word = engine.next_word(&list).unwrap();
            assert!(list.contains(&word));
            assert_ne!(word, previous);
            previous = word;
        }
    }

    #[test]
    fn empty_list_has_no_groups() {
        let mut engine = engine();
        engine.on_word_list_observed(&words(&["cat"]));
        engine.on_word_list_observed(&[]);
        assert!(engine.groups().is_empty());
        assert!(engine.current_group().is_none());
        assert_eq!(engine.next_word(&[]), None);
        assert_eq!(engine.target_speed(), 75);
    }

    #[test]
    fn next_word_comes_from_current_group() {
        let mut engine = engine();
        let list = words(&["cat", "dog", "bird"]);
        for _ in 0..50 {
            let word = engine.next_word(&list).unwrap();
            assert!(list.contains(&word));
        }
    }

    #[test]
    fn next_word_never_repeats_back_to_back() {
        let mut engine = engine();
        let list = words(&["cat", "dog"]);
        let mut previous = engine.next_word(&list).unwrap();
        for _ in 0..1000 {
            let word = engine.next_word(&list).unwrap();
            assert_ne!(word, previous);
            previous = word;
        }
    }

    #[test]
    fn single_word_group_repeats() {
        let mut engine = engine();
        let list = words(&["solo"]);
        for _ in 0..10 {
            assert_eq!(engine.next_word(&list).as_deref(), Some("solo"));
        }
    }

    #[test]
    fn next_word_favours_unbeaten_words() {
        let mut engine = engine();
        let list = words(&["a", "b", "c", "d"]);
        engine.on_word_list_observed(&list);
        record(&mut engine, &[("a", 30.0), ("b", 30.0), ("c", 30.0), ("d", 10.0)]);
        let threshold = engine.current_group().unwrap().threshold();
        assert!(threshold >= 10 && threshold < 30);

        let mut served_d = 0;
        for _ in 0..2000 {
            if engine.next_word(&list).as_deref() == Some("d") {
                served_d += 1;
            }
        }
        // Uniform picking would serve "d" about a quarter of the time.
        assert!(served_d > 650, "d served {served_d} times");
    }

    #[test]
    fn test_completion_records_speeds_and_misses() {
        let mut engine = engine();
        engine.on_word_list_observed(&words(&["cat", "dog"]));
        let mut missed = BTreeMap::new();
        missed.insert("dog".to_string(), 2);

        engine.on_test_completed(&TestResults {
            history: words(&["cat", "dog"]),
            burst_speeds: vec![60.0, 70.0],
            missed_words: missed,
            difficulty_failed: false,
        });

        assert_eq!(engine.store().get_record("cat").speeds, vec![60.0]);
        assert_eq!(engine.store().get_record("dog").speeds, vec![70.0]);
        assert_eq!(engine.store().miss_count_of("dog"), 2);
    }

    #[test]
    fn failed_test_keeps_only_misses() {
        let mut engine = engine();
        engine.on_word_list_observed(&words(&["cat"]));
        let mut missed = BTreeMap::new();
        missed.insert("cat".to_string(), 1);

        engine.on_test_completed(&TestResults {
            history: words(&["cat"]),
            burst_speeds: vec![60.0],
            missed_words: missed,
            difficulty_failed: true,
        });

        assert!(engine.store().get_record("cat").speeds.is_empty());
        assert_eq!(engine.store().miss_count_of("cat"), 1);
    }

    #[test]
    fn results_processed_is_emitted_last() {
        let mut engine = engine();
        engine.on_word_list_observed(&words(&["cat", "dog"]));
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner = Rc::clone(&log);
        engine.subscribe(move |event, _| inner.borrow_mut().push(event.clone()));

        record(&mut engine, &[("cat", 40.0)]);

        let log = log.borrow();
        match log.last() {
            Some(PracticeEvent::ResultsProcessed {
                current_group,
                word_list,
                target_speed,
            }) => {
                assert!(current_group.is_some());
                assert_eq!(word_list, &Wordset::from(&["cat", "dog"][..]));
                assert_eq!(*target_speed, 75);
            }
            other => panic!("unexpected last event {other:?}"),
        }
    }

    #[test]
    fn group_threshold_rises_after_results() {
        let mut engine = engine();
        engine.on_word_list_observed(&words(&["cat", "dog"]));
        record(&mut engine, &[("cat", 40.0), ("dog", 50.0)]);

        let group = engine.current_group().unwrap();
        assert_eq!(group.threshold(), 41);
        assert_eq!(
            group.unbeaten_wordset(engine.store().stats()),
            Wordset::from(&["cat"][..])
        );
    }

    #[test]
    fn advances_to_next_incomplete_group() {
        let mut engine = engine();
        engine.set_config("groupSize", "1").unwrap();
        engine.on_word_list_observed(&words(&["cat", "dog"]));
        assert_eq!(engine.current_position(), Some(0));
        let first = engine.current_group().unwrap().wordset().words()[0].clone();
        let log = event_names(&mut engine);

        record(&mut engine, &[(first.as_str(), 100.0)]);

        assert_eq!(engine.current_position(), Some(1));
        assert!(log.borrow().contains(&"next-group-selected"));
    }

    #[test]
    fn clearing_every_group_raises_target_and_rebuilds() {
        let mut engine = engine();
        engine.on_word_list_observed(&words(&["cat", "dog"]));
        record(&mut engine, &[("cat", 78.0), ("dog", 79.0)]);

        assert_eq!(engine.target_speed(), 80);
        assert_eq!(engine.current_group().unwrap().wordset().len(), 2);
    }

    #[test]
    fn target_speed_change_regenerates() {
        let mut engine = engine();
        engine.on_word_list_observed(&words(&["cat", "dog"]));
        record(&mut engine, &[("cat", 90.0)]);
        assert_eq!(engine.current_group().unwrap().wordset().len(), 2);

        let log = event_names(&mut engine);
        assert!(engine.set_config("targetSpeed", "80").unwrap());

        assert!(log.borrow().contains(&"config-key-changed"));
        assert!(log.borrow().contains(&"groups-regenerated"));
        assert_eq!(
            engine.current_group().unwrap().wordset(),
            &Wordset::from(&["dog"][..])
        );
    }

    #[test]
    fn sorter_change_does_not_regenerate() {
        let mut engine = engine();
        engine.on_word_list_observed(&words(&["cat", "dog"]));
        let log = event_names(&mut engine);

        assert!(engine.set_config("sorter", "speed-desc").unwrap());

        assert_eq!(*log.borrow(), vec!["config-key-changed"]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut engine = engine();
        assert_matches!(
            engine.set_config("unbeatenWordPercentage", "5"),
            Err(PracticeError::InvalidConfig { .. })
        );
        assert_matches!(
            engine.set_config("groupSize", "0"),
            Err(PracticeError::InvalidConfig { .. })
        );
        assert_eq!(engine.config().unbeaten_word_percentage(), 60);
        assert_eq!(engine.config().group_size(), 30);
    }

    #[test]
    fn reset_word_brings_it_back() {
        let mut engine = engine();
        engine.on_word_list_observed(&words(&["cat", "dog"]));
        record(&mut engine, &[("cat", 100.0)]);
        engine.on_word_list_observed(&words(&["cat", "dog", "eel"]));
        assert!(!engine.current_group().unwrap().wordset().contains("cat"));

        engine.reset_word("cat");

        assert!(!engine.store().has_cleared_speed("cat", 75));
        assert!(engine.current_group().unwrap().wordset().contains("cat"));
    }

    #[test]
    fn reset_current_words_emits_batch() {
        let mut engine = engine();
        engine.on_word_list_observed(&words(&["cat", "dog"]));
        record(&mut engine, &[("cat", 100.0), ("dog", 20.0)]);
        let log = event_names(&mut engine);

        engine.reset_current_words();

        assert_eq!(log.borrow().iter().filter(|n| **n == "words-reset").count(), 1);
        assert!(!log.borrow().contains(&"word-reset"));
        assert_eq!(engine.store().typed_count_of("cat"), 0);
        assert_eq!(engine.store().typed_count_of("dog"), 0);
    }

    #[test]
    fn word_typed_animations() {
        let mut engine = engine();
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner = Rc::clone(&log);
        engine.subscribe(move |event, _| inner.borrow_mut().push(event.clone()));

        let typed = |word: &str, correct, burst| WordTyped {
            word: word.to_string(),
            correct,
            burst,
            handle: UiHandle(7),
        };
        engine.on_word_typed(&typed("fast", true, 90.0));
        engine.on_word_typed(&typed("slow", true, 50.0));
        engine.on_word_typed(&typed("wrong", false, 120.0));

        assert_eq!(
            *log.borrow(),
            vec![
                PracticeEvent::WordBeaten {
                    word: "fast".into(),
                    burst: 90.0,
                    handle: UiHandle(7),
                },
                PracticeEvent::WordMissed {
                    word: "slow".into(),
                    burst: 50.0,
                    handle: UiHandle(7),
                },
            ]
        );

        engine.set_config("animationsEnabled", "0").unwrap();
        let before = log.borrow().len();
        engine.on_word_typed(&typed("fast", true, 90.0));
        assert_eq!(log.borrow().len(), before);
    }

    #[test]
    fn progress_meters() {
        let mut engine = engine();
        engine.on_word_list_observed(&words(&["cat", "dog", "eel", "fox"]));
        assert_eq!(engine.total_progress().percent(), 0.0);

        record(&mut engine, &[("cat", 100.0)]);

        let total = engine.total_progress();
        assert_eq!(total, Progress { beaten: 1, total: 4 });
        assert_eq!(total.percent(), 25.0);
        assert_eq!(engine.group_progress(), Progress { beaten: 1, total: 4 });
        assert_eq!(Progress { beaten: 0, total: 0 }.percent(), 0.0);
    }

    #[test]
    fn word_status_flags() {
        let mut engine = engine();
        engine.on_word_list_observed(&words(&["cat", "dog"]));
        record(&mut engine, &[("cat", 30.0), ("dog", 150.0)]);

        let cat = engine.word_status("cat");
        assert!(cat.typed);
        assert!(!cat.beaten_at_target);
        assert_eq!(cat.completion, 0.4);

        let dog = engine.word_status("dog");
        assert!(dog.beaten_at_group);
        assert!(dog.beaten_at_target);
        assert_eq!(dog.completion, 1.0);

        let eel = engine.word_status("eel");
        assert!(!eel.typed);
        assert_eq!(eel.completion, 0.0);
    }

    #[test]
    fn sorted_current_words_follow_sorter() {
        let mut engine = engine();
        engine.on_word_list_observed(&words(&["pear", "Apple", "fig"]));
        assert_eq!(engine.sorted_current_words(), words(&["Apple", "fig", "pear"]));

        engine.set_config("sorter", "alphabetical-desc").unwrap();
        assert_eq!(engine.sorted_current_words(), words(&["pear", "fig", "Apple"]));
    }

    #[test]
    fn sorted_words_random_order_follows_seed() {
        let list = words(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        let shuffled = |seed| {
            let store = WordStatsStore::open(MemoryBackend::new()).unwrap();
            let mut engine = AdaptiveEngine::with_seed(store, seed);
            engine.set_config("sorter", "random").unwrap();
            engine.sorted_words(&list)
        };

        assert_eq!(shuffled(5), shuffled(5));
        let mut sorted = shuffled(5);
        sorted.sort();
        assert_eq!(sorted, list);
    }

    #[test]
    fn import_rebuilds_groups() {
        let mut engine = engine();
        engine.on_word_list_observed(&words(&["cat", "dog"]));

        engine
            .import_all(r#"{"words": {"cat": {"speeds": [99], "missedCount": 0}}, "config": {}}"#)
            .unwrap();

        assert_eq!(
            engine.current_group().unwrap().wordset(),
            &Wordset::from(&["dog"][..])
        );
        assert_matches!(
            engine.import_all(r#"{"words": {}}"#),
            Err(PracticeError::MalformedImport { .. })
        );
    }

    #[test]
    fn import_with_invalid_config_changes_nothing() {
        let mut engine = engine();
        engine.on_word_list_observed(&words(&["cat", "dog"]));
        record(&mut engine, &[("cat", 40.0)]);
        let groups_before = engine.groups().to_vec();

        assert_matches!(
            engine.import_all(
                r#"{"words": {}, "config": {
                    "unbeatenWordPercentage": "5", "groupSize": "0", "targetSpeed": "-4"
                }}"#
            ),
            Err(PracticeError::InvalidConfig { .. })
        );

        assert_eq!(engine.store().config_value("unbeatenWordPercentage"), None);
        assert_eq!(engine.store().config_value("groupSize"), None);
        assert_eq!(engine.store().get_record("cat").speeds, vec![40.0]);
        assert_eq!(engine.groups(), groups_before.as_slice());
    }

    #[test]
    fn announce_config_reports_defaults() {
        let mut engine = engine();
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner = Rc::clone(&log);
        engine.subscribe(move |event, _| inner.borrow_mut().push(event.clone()));

        engine.announce_config();

        assert_eq!(
            *log.borrow(),
            vec![PracticeEvent::ConfigInitialized {
                sorter: crate::sorting::Sorter::AlphabeticalAsc,
                target_speed: 75,
                group_size: 30,
            }]
        );
    }
}
