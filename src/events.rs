use crate::config::ConfigChange;
use crate::group::PracticeGroup;
use crate::sorting::Sorter;
use crate::stats::WordRecord;
use crate::wordset::Wordset;
use tracing::{trace, warn};

/// Nested emissions deeper than this are dropped.
const MAX_DISPATCH_DEPTH: usize = 32;

/// Opaque collaborator handle passed through word-typed notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UiHandle(pub u64);

/// Notifications emitted by the engine and its services.
#[derive(Debug, Clone, PartialEq)]
pub enum PracticeEvent {
    ConfigInitialized {
        sorter: Sorter,
        target_speed: u32,
        group_size: usize,
    },
    ConfigKeyChanged(ConfigChange),
    GroupsRegenerated {
        groups: Vec<PracticeGroup>,
    },
    NextGroupSelected {
        group: PracticeGroup,
        position: usize,
    },
    ThresholdChanged {
        threshold: u32,
    },
    ResultsProcessed {
        current_group: Option<PracticeGroup>,
        word_list: Wordset,
        target_speed: u32,
    },
    WordUpdated {
        word: String,
        record: WordRecord,
    },
    WordReset {
        word: String,
    },
    WordsReset {
        words: Vec<String>,
    },
    WordBeaten {
        word: String,
        burst: f64,
        handle: UiHandle,
    },
    WordMissed {
        word: String,
        burst: f64,
        handle: UiHandle,
    },
}

impl PracticeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PracticeEvent::ConfigInitialized { .. } => "config-initialized",
            PracticeEvent::ConfigKeyChanged(_) => "config-key-changed",
            PracticeEvent::GroupsRegenerated { .. } => "groups-regenerated",
            PracticeEvent::NextGroupSelected { .. } => "next-group-selected",
            PracticeEvent::ThresholdChanged { .. } => "threshold-changed",
            PracticeEvent::ResultsProcessed { .. } => "results-processed",
            PracticeEvent::WordUpdated { .. } => "word-updated",
            PracticeEvent::WordReset { .. } => "word-reset",
            PracticeEvent::WordsReset { .. } => "words-reset",
            PracticeEvent::WordBeaten { .. } => "word-beaten",
            PracticeEvent::WordMissed { .. } => "word-missed",
        }
    }
}

/// Follow-up notifications a listener wants delivered.
#[derive(Debug, Default)]
pub struct Outbox {
    pending: Vec<PracticeEvent>,
}

impl Outbox {
    pub fn emit(&mut self, event: PracticeEvent) {
        self.pending.push(event);
    }
}

type Listener = Box<dyn FnMut(&PracticeEvent, &mut Outbox)>;

/// Synchronous, in-order notification dispatch.
///
/// Listeners run in registration order. Anything a listener emits into its
/// [`Outbox`] is dispatched completely before the next listener sees the
/// original event.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
    depth: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&PracticeEvent, &mut Outbox) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn emit(&mut self, event: PracticeEvent) {
        self.dispatch(&event);
    }

    fn dispatch(&mut self, event: &PracticeEvent) {
        if self.depth >= MAX_DISPATCH_DEPTH {
            warn!(event = event.name(), "dropping notification: dispatch nested too deep");
            return;
        }
        trace!(event = event.name(), "dispatch");

        self.depth += 1;
        for i in 0..self.listeners.len() {
            let mut outbox = Outbox::default();
            (self.listeners[i])(event, &mut outbox);
            for follow_up in outbox.pending {
                self.dispatch(&follow_up);
            }
        }
        self.depth -= 1;
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
