//! An editor session: every open document has its own panes listening on its
//! source, while a few workbench-wide handlers observe everything.

use std::sync::Arc;

use herald::{Bus, Registration, SourceId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    events::{BufferSnapshot, Counter, Keystroke},
    scenarios::Scenario,
};

#[derive(Debug, Clone)]
pub struct EditorSessionConfig {
    pub documents: usize,
    /// Scoped handlers per document (editor, gutter, minimap ...).
    pub panes_per_document: usize,
    /// Unscoped handlers (status bar, outline ...).
    pub workbench_handlers: usize,
    pub keystrokes_per_update: usize,
    /// One snapshot is fired every this many keystrokes.
    pub snapshot_every: usize,
    pub snapshot_len: usize,
    pub seed: u64,
}

impl Default for EditorSessionConfig {
    fn default() -> Self {
        Self {
            documents: 20,
            panes_per_document: 3,
            workbench_handlers: 4,
            keystrokes_per_update: 1_000,
            snapshot_every: 100,
            snapshot_len: 4_096,
            seed: 42,
        }
    }
}

pub struct EditorSessionScenario {
    config: EditorSessionConfig,
    bus: Bus,
    rng: ChaCha8Rng,
    counter: Arc<Counter>,
    registrations: Vec<Registration>,
}

impl EditorSessionScenario {
    pub fn new() -> Self {
        Self::with_config(EditorSessionConfig::default())
    }

    pub fn with_config(config: EditorSessionConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            bus: Bus::new(),
            rng,
            counter: Arc::new(Counter::default()),
            registrations: Vec::new(),
        }
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Total deliveries observed so far.
    pub fn hits(&self) -> u64 {
        self.counter.hits()
    }
}

impl Default for EditorSessionScenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario for EditorSessionScenario {
    fn name(&self) -> &'static str {
        "editor_session"
    }

    fn description(&self) -> &'static str {
        "scoped per-document panes plus workbench handlers under keystroke traffic"
    }

    fn handler_count(&self) -> usize {
        self.bus.handler_count::<Keystroke>() + self.bus.handler_count::<BufferSnapshot>()
    }

    fn setup(&mut self) {
        for document in 0..self.config.documents {
            let source = SourceId::new(document as u64);
            for _ in 0..self.config.panes_per_document {
                self.registrations.push(
                    self.bus
                        .register_for_source::<Keystroke, _>(source, Arc::clone(&self.counter)),
                );
                self.registrations.push(
                    self.bus
                        .register_for_source::<BufferSnapshot, _>(source, Arc::clone(&self.counter)),
                );
            }
        }
        for _ in 0..self.config.workbench_handlers {
            self.registrations
                .push(self.bus.register::<Keystroke, _>(Arc::clone(&self.counter)));
            self.registrations
                .push(self.bus.register::<BufferSnapshot, _>(Arc::clone(&self.counter)));
        }
    }

    fn update(&mut self) {
        let documents = self.config.documents.max(1) as u64;
        for offset in 0..self.config.keystrokes_per_update {
            let document = self.rng.gen_range(0..documents);
            let source = SourceId::new(document);
            let keystroke = Keystroke {
                document,
                offset: offset as u64,
                ch: 'a',
            };
            // Counter never fails.
            let _ = self.bus.fire_from_source(source, &keystroke);

            if self.config.snapshot_every > 0 && offset % self.config.snapshot_every == 0 {
                let snapshot = BufferSnapshot::with_len(document, self.config.snapshot_len);
                let _ = self.bus.fire_from_source(source, &snapshot);
            }
        }
    }

    fn teardown(&mut self) {
        for registration in self.registrations.drain(..) {
            registration.remove();
        }
    }
}
