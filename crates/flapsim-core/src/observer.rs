//! Tick-level observation hook
//!
//! Lets renderers or loggers watch a generation without the evaluator
//! depending on them.

use crate::agent::Agent;
use crate::obstacle::ObstaclePair;

/// Read-only view of a generation after a tick completed
#[derive(Debug, Clone, Copy)]
pub struct TickSnapshot<'a> {
    pub generation_index: u64,
    pub tick: u64,
    pub agents: &'a [Agent],
    pub obstacles: &'a [ObstaclePair],
    pub ground_offset: f32,
    pub score: u32,
}

impl TickSnapshot<'_> {
    pub fn alive(&self) -> usize {
        self.agents.iter().filter(|a| a.is_alive()).count()
    }
}

pub trait TickObserver {
    fn on_tick(&mut self, snapshot: &TickSnapshot<'_>);
}

/// Observer that ignores every tick
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObserver;

impl TickObserver for NoObserver {
    fn on_tick(&mut self, _snapshot: &TickSnapshot<'_>) {}
}

impl<F: FnMut(&TickSnapshot<'_>)> TickObserver for F {
    fn on_tick(&mut self, snapshot: &TickSnapshot<'_>) {
        self(snapshot)
    }
}
