//! Subscription churn: panes open and close while events keep firing, so
//! fires regularly overlap copy-on-write updates of the handler list.

use std::sync::Arc;

use herald::{Bus, Registration};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    events::{Counter, Keystroke},
    scenarios::Scenario,
};

#[derive(Debug, Clone)]
pub struct ChurnConfig {
    pub initial_handlers: usize,
    pub ops_per_update: usize,
    /// Fires between two register / unregister operations.
    pub fires_per_op: usize,
    /// Probability that an operation registers rather than unregisters.
    pub register_ratio: f64,
    pub seed: u64,
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self {
            initial_handlers: 32,
            ops_per_update: 200,
            fires_per_op: 4,
            register_ratio: 0.5,
            seed: 42,
        }
    }
}

pub struct ChurnScenario {
    config: ChurnConfig,
    bus: Bus,
    rng: ChaCha8Rng,
    counter: Arc<Counter>,
    registrations: Vec<Registration>,
}

impl ChurnScenario {
    pub fn new() -> Self {
        Self::with_config(ChurnConfig::default())
    }

    pub fn with_config(config: ChurnConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            bus: Bus::new(),
            rng,
            counter: Arc::new(Counter::default()),
            registrations: Vec::new(),
        }
    }

    fn register_one(&mut self) {
        let registration = self.bus.register::<Keystroke, _>(Arc::clone(&self.counter));
        self.registrations.push(registration);
    }

    fn unregister_one(&mut self) {
        if self.registrations.is_empty() {
            return;
        }
        let index = self.rng.gen_range(0..self.registrations.len());
        self.registrations.swap_remove(index).remove();
    }
}

impl Default for ChurnScenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario for ChurnScenario {
    fn name(&self) -> &'static str {
        "churn"
    }

    fn description(&self) -> &'static str {
        "random register / unregister interleaved with fires"
    }

    fn handler_count(&self) -> usize {
        self.bus.handler_count::<Keystroke>()
    }

    fn setup(&mut self) {
        for _ in 0..self.config.initial_handlers {
            self.register_one();
        }
    }

    fn update(&mut self) {
        for op in 0..self.config.ops_per_update {
            if self.rng.gen_bool(self.config.register_ratio) {
                self.register_one();
            } else {
                self.unregister_one();
            }
            for fire in 0..self.config.fires_per_op {
                let keystroke = Keystroke {
                    document: 0,
                    offset: (op * self.config.fires_per_op + fire) as u64,
                    ch: ' ',
                };
                // Counter never fails.
                let _ = self.bus.fire(&keystroke);
            }
        }
    }

    fn teardown(&mut self) {
        for registration in self.registrations.drain(..) {
            registration.remove();
        }
    }
}
