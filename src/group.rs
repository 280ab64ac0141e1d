use crate::events::{EventBus, PracticeEvent};
use crate::partition::partition;
use crate::stats::WordStats;
use crate::wordset::Wordset;
use rand::Rng;
use tracing::{debug, warn};

/// How far a group threshold moves per bump.
pub const THRESHOLD_STEP: u32 = 5;

/// Bumps allowed one at a time before jumping straight to the needed value.
const MAX_STEPPED_BUMPS: usize = 10_000;

/// A batch of words practised together, with its own escalating bar.
///
/// Membership never changes after creation and the threshold only ever
/// goes up.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeGroup {
    words: Wordset,
    threshold: u32,
}

impl PracticeGroup {
    pub fn new(words: Wordset) -> Self {
        Self {
            words,
            threshold: 1,
        }
    }

    pub fn wordset(&self) -> &Wordset {
        &self.words
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn bump_threshold(&mut self, bus: &mut EventBus) {
        self.threshold = self.threshold.saturating_add(THRESHOLD_STEP);
        bus.emit(PracticeEvent::ThresholdChanged {
            threshold: self.threshold,
        });
    }

    /// Members whose median speed has not yet cleared the group threshold.
    pub fn unbeaten_wordset(&self, stats: &WordStats) -> Wordset {
        self.words
            .words()
            .iter()
            .filter(|word| !stats.has_cleared_speed(word, self.threshold))
            .cloned()
            .collect::<Vec<_>>()
            .into()
    }

    /// Words in this group cleared at `target_speed`.
    pub fn beaten_count(&self, stats: &WordStats, target_speed: u32) -> usize {
        self.words
            .words()
            .iter()
            .filter(|word| stats.has_cleared_speed(word, target_speed))
            .count()
    }

    pub fn is_complete(&self, stats: &WordStats, target_speed: u32) -> bool {
        self.beaten_count(stats, target_speed) == self.words.len()
    }

    /// Bump until at least one member is unbeaten. No-op for an empty group.
    ///
    /// Returns the number of bumps made.
    pub fn raise_threshold_until_some_words_unbeaten(
        &mut self,
        stats: &WordStats,
        bus: &mut EventBus,
    ) -> usize {
        if self.words.is_empty() {
            return 0;
        }

        let mut bumps = 0;
        while self.unbeaten_wordset(stats).is_empty() {
            if bumps == MAX_STEPPED_BUMPS {
                self.jump_past_slowest(stats, bus);
                break;
            }
            self.bump_threshold(bus);
            bumps += 1;
        }
        if bumps > 0 {
            debug!(threshold = self.threshold, bumps, "raised group threshold");
        }
        bumps
    }

    fn jump_past_slowest(&mut self, stats: &WordStats, bus: &mut EventBus) {
        let slowest = self
            .words
            .words()
            .iter()
            .map(|word| stats.median_speed(word))
            .fold(f64::INFINITY, f64::min);
        let gap = (slowest - f64::from(self.threshold)).max(0.0);
        let steps = (gap / f64::from(THRESHOLD_STEP)).ceil();
        let raised = f64::from(self.threshold) + steps * f64::from(THRESHOLD_STEP);
        warn!(slowest, "group speeds far above threshold; jumping");

        self.threshold = if raised >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            raised as u32
        };
        bus.emit(PracticeEvent::ThresholdChanged {
            threshold: self.threshold,
        });
    }
}

/// The groups built from the active word list.
///
/// The sequence is only ever replaced as a whole.
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: Vec<PracticeGroup>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> &[PracticeGroup] {
        &self.groups
    }

    pub fn get(&self, index: usize) -> Option<&PracticeGroup> {
        self.groups.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut PracticeGroup> {
        self.groups.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn regenerate<R: Rng + ?Sized>(
        &mut self,
        words: Vec<String>,
        desired_group_size: usize,
        rng: &mut R,
        bus: &mut EventBus,
    ) {
        self.groups = partition(words, desired_group_size, rng)
            .into_iter()
            .map(PracticeGroup::new)
            .collect();
        debug!(groups = self.groups.len(), desired_group_size, "regenerated groups");

        bus.emit(PracticeEvent::GroupsRegenerated {
            groups: self.groups.clone(),
        });
        if let Some(first) = self.groups.first() {
            bus.emit(PracticeEvent::NextGroupSelected {
                group: first.clone(),
                position: 0,
            });
        }
    }

    pub fn first_incomplete_index(&self, stats: &WordStats, target_speed: u32) -> Option<usize> {
        self.groups
            .iter()
            .position(|group| !group.is_complete(stats, target_speed))
    }

    /// First group with a word not yet cleared at `target_speed`.
    pub fn first_incomplete_group(
        &self,
        stats: &WordStats,
        target_speed: u32,
    ) -> Option<&PracticeGroup> {
        self.first_incomplete_index(stats, target_speed)
            .and_then(|i| self.groups.get(i))
    }
}
