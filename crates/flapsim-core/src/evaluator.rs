//! Generation evaluator
//!
//! Runs one generation in lock-step ticks. Each tick has three phases:
//! 1. Advance: spawn/scroll obstacles and ground (only phase that mutates the field)
//! 2. Evaluate: every live agent observes, decides, moves and is scored
//!    against the frozen field (parallel with the `parallel` feature)
//! 3. Bookkeeping: score cleared pairs, prune off-screen pairs, test for completion
//!
//! Pruning runs after evaluation, so a pair leaving the field on the same
//! tick an agent clears it still pays its bonus.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use flapsim_simulation::{ConfigError, SimConfig};

use crate::agent::{Agent, DeathCause};
use crate::collision::CollisionOracle;
use crate::ground::Ground;
use crate::ledger::{PassLedger, mark_passed};
use crate::obstacle::{ObstacleField, ObstaclePair};
use crate::observer::{NoObserver, TickObserver, TickSnapshot};
use crate::policy::{Action, Observation, Policy, PolicyAdapter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationPhase {
    Spawning,
    Running,
    Complete,
}

/// Why a generation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionReason {
    /// No policies were supplied
    Empty,
    AllDead,
    ScoreCeiling,
    TickLimit,
}

/// Final state of one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutcome {
    pub index: usize,
    pub fitness: f64,
    pub frames_survived: u64,
    pub pipes_passed: u32,
    pub death: Option<DeathCause>,
    pub death_tick: Option<u64>,
}

impl From<&Agent> for AgentOutcome {
    fn from(agent: &Agent) -> Self {
        Self {
            index: agent.index,
            fitness: agent.fitness,
            frames_survived: agent.frames_survived,
            pipes_passed: agent.pipes_passed,
            death: agent.death_cause(),
            death_tick: agent.death_tick,
        }
    }
}

/// Result of one generation, index-aligned with the supplied policies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation_index: u64,
    pub fitnesses: Vec<f64>,
    pub outcomes: Vec<AgentOutcome>,
    pub ticks: u64,
    pub score: u32,
    pub completion: CompletionReason,
    pub obstacles_spawned: u32,
}

impl GenerationReport {
    /// Index and fitness of the fittest agent (first wins ties)
    pub fn best(&self) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (index, &fitness) in self.fitnesses.iter().enumerate() {
            if best.is_none_or(|(_, b)| fitness > b) {
                best = Some((index, fitness));
            }
        }
        best
    }

    pub fn mean_fitness(&self) -> f64 {
        if self.fitnesses.is_empty() {
            return 0.0;
        }
        self.fitnesses.iter().sum::<f64>() / self.fitnesses.len() as f64
    }
}

/// Everything belonging to one generation; built fresh and dropped after
pub struct GenerationState {
    generation_index: u64,
    agents: Vec<Agent>,
    field: ObstacleField,
    ground: Ground,
    ledger: PassLedger,
    tick: u64,
    score: u32,
    phase: GenerationPhase,
}

impl GenerationState {
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn obstacles(&self) -> &[ObstaclePair] {
        self.field.pairs()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn phase(&self) -> GenerationPhase {
        self.phase
    }

    pub fn alive(&self) -> usize {
        self.agents.iter().filter(|a| a.is_alive()).count()
    }

    pub fn snapshot(&self) -> TickSnapshot<'_> {
        TickSnapshot {
            generation_index: self.generation_index,
            tick: self.tick,
            agents: &self.agents,
            obstacles: self.field.pairs(),
            ground_offset: self.ground.offset(),
            score: self.score,
        }
    }

    fn report(&self, completion: CompletionReason) -> GenerationReport {
        GenerationReport {
            generation_index: self.generation_index,
            fitnesses: self.agents.iter().map(|a| a.fitness).collect(),
            outcomes: self.agents.iter().map(AgentOutcome::from).collect(),
            ticks: self.tick,
            score: self.score,
            completion,
            obstacles_spawned: self.field.spawned(),
        }
    }
}

/// Per-tick read-only context shared by every agent during evaluation
struct TickContext<'a> {
    config: &'a SimConfig,
    oracle: &'a CollisionOracle,
    field: &'a ObstacleField,
    tick: u64,
}

impl TickContext<'_> {
    fn step_agent<P: Policy>(&self, agent: &mut Agent, policy: &mut P, passed: &mut [bool]) {
        if !agent.is_alive() {
            return;
        }
        let config = self.config;
        let nearest = self.field.nearest_ahead(agent.position.x);
        let observation = match nearest {
            Some(pair) => Observation::new(agent, pair, config.gap_height),
            None => {
                let center = config.playfield_height / 2.0;
                Observation::from_gap(
                    agent,
                    center - config.gap_height / 2.0,
                    center + config.gap_height / 2.0,
                )
            }
        };

        let action = match PolicyAdapter::act(policy, &observation) {
            Ok(action) => action,
            Err(err) => {
                log::warn!(
                    "Agent {} retired at tick {} with fitness {:.2}: {}",
                    agent.index,
                    self.tick,
                    agent.fitness,
                    err
                );
                agent.kill(DeathCause::PolicyFault, self.tick);
                return;
            }
        };

        match action {
            Action::Jump => agent.apply_impulse(config.jump_velocity),
            Action::Idle => agent.apply_gravity(config.gravity, config.max_fall_speed),
        }
        agent.advance();

        let death = self.oracle.out_of_bounds(agent).or_else(|| {
            nearest
                .filter(|pair| self.oracle.collides(agent, pair))
                .map(|_| DeathCause::Obstacle)
        });
        if let Some(cause) = death {
            agent.clamp_to_bounds(cause, config);
            agent.fitness -= config.collision_penalty;
            agent.kill(cause, self.tick);
            log::debug!(
                "Agent {} died ({:?}) at tick {} with fitness {:.2}",
                agent.index,
                cause,
                self.tick,
                agent.fitness
            );
            return;
        }

        agent.fitness += config.survival_reward;
        agent.frames_survived += 1;
        for pair in self.field.pairs() {
            if pair.x < agent.position.x && mark_passed(passed, pair.slot) {
                agent.fitness += config.pass_bonus;
                agent.pipes_passed += 1;
            }
        }
    }
}

/// Evaluates whole generations against a validated configuration
pub struct GenerationEvaluator {
    config: SimConfig,
    oracle: CollisionOracle,
}

impl GenerationEvaluator {
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let oracle = CollisionOracle::new(&config);
        Ok(Self { config, oracle })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn oracle(&self) -> &CollisionOracle {
        &self.oracle
    }

    /// Run a generation to completion and return per-policy fitness
    pub fn evaluate<P: Policy>(
        &self,
        policies: &mut [P],
        generation_index: u64,
    ) -> GenerationReport {
        self.evaluate_observed(policies, generation_index, &mut NoObserver)
    }

    /// Like [`Self::evaluate`], calling `observer` after every tick
    pub fn evaluate_observed<P: Policy, O: TickObserver + ?Sized>(
        &self,
        policies: &mut [P],
        generation_index: u64,
        observer: &mut O,
    ) -> GenerationReport {
        let mut state = self.start(policies.len(), generation_index);
        if policies.is_empty() {
            state.phase = GenerationPhase::Complete;
            log::debug!("Generation {} has no policies", generation_index);
            return state.report(CompletionReason::Empty);
        }

        let completion = loop {
            let finished = self.step(&mut state, policies);
            observer.on_tick(&state.snapshot());
            if let Some(reason) = finished {
                break reason;
            }
        };

        log::debug!(
            "Generation {} complete after {} ticks (score {}, {:?})",
            generation_index,
            state.tick,
            state.score,
            completion
        );
        state.report(completion)
    }

    /// Fresh state: every agent alive at the start position, one pair placed
    pub fn start(&self, agent_count: usize, generation_index: u64) -> GenerationState {
        let field = ObstacleField::new(&self.config, generation_index);
        let ledger = PassLedger::new(agent_count, field.capacity());
        GenerationState {
            generation_index,
            agents: (0..agent_count)
                .map(|index| Agent::new(index, &self.config))
                .collect(),
            field,
            ground: Ground::new(self.config.ground_tile_width, self.config.scroll_speed),
            ledger,
            tick: 0,
            score: 0,
            phase: GenerationPhase::Spawning,
        }
    }

    /// Advance `state` by one tick, returning why it finished if it did
    pub fn step<P: Policy>(
        &self,
        state: &mut GenerationState,
        policies: &mut [P],
    ) -> Option<CompletionReason> {
        assert_eq!(
            policies.len(),
            state.agents.len(),
            "one policy per agent required"
        );
        debug_assert_ne!(state.phase, GenerationPhase::Complete);
        state.phase = GenerationPhase::Running;
        state.tick += 1;
        let tick = state.tick;

        // Advance phase
        if let Some(slot) = state.field.spawn_if_needed(tick) {
            state.ledger.reset_slot(slot);
        }
        state.field.advance();
        state.ground.advance();

        // Evaluate phase: the field is borrowed immutably until this ends
        let ctx = TickContext {
            config: &self.config,
            oracle: &self.oracle,
            field: &state.field,
            tick,
        };
        #[cfg(feature = "parallel")]
        state
            .agents
            .par_iter_mut()
            .zip(policies.par_iter_mut())
            .zip(state.ledger.par_rows_mut())
            .for_each(|((agent, policy), passed)| ctx.step_agent(agent, policy, passed));
        #[cfg(not(feature = "parallel"))]
        for ((agent, policy), passed) in state
            .agents
            .iter_mut()
            .zip(policies.iter_mut())
            .zip(state.ledger.rows_mut())
        {
            ctx.step_agent(agent, policy, passed);
        }

        // Bookkeeping phase
        let alive = state.alive();
        if alive > 0 {
            let cleared = state.field.mark_cleared(self.config.agent_x);
            if cleared > 0 {
                state.score += cleared;
                log::debug!(
                    "Generation {}: score {} at tick {} ({} alive)",
                    state.generation_index,
                    state.score,
                    tick,
                    alive
                );
            }
        }
        state.field.prune();

        let finished = if alive == 0 {
            Some(CompletionReason::AllDead)
        } else if self
            .config
            .score_ceiling
            .is_some_and(|ceiling| state.score >= ceiling)
        {
            Some(CompletionReason::ScoreCeiling)
        } else if self.config.tick_limit.is_some_and(|limit| tick >= limit) {
            Some(CompletionReason::TickLimit)
        } else {
            None
        };
        if finished.is_some() {
            state.phase = GenerationPhase::Complete;
        }
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ConstantPolicy;

    fn seeded() -> SimConfig {
        SimConfig {
            seed: Some(11),
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SimConfig {
            gap_height: 0.0,
            ..Default::default()
        };
        assert!(GenerationEvaluator::new(config).is_err());
    }

    #[test]
    fn test_empty_generation_completes_immediately() {
        let evaluator = GenerationEvaluator::new(seeded()).unwrap();
        let mut policies: Vec<ConstantPolicy> = Vec::new();
        let report = evaluator.evaluate(&mut policies, 0);
        assert_eq!(report.completion, CompletionReason::Empty);
        assert!(report.fitnesses.is_empty());
        assert_eq!(report.ticks, 0);
        assert_eq!(report.best(), None);
    }

    #[test]
    fn test_start_state() {
        let evaluator = GenerationEvaluator::new(seeded()).unwrap();
        let state = evaluator.start(4, 0);
        assert_eq!(state.phase(), GenerationPhase::Spawning);
        assert_eq!(state.agents().len(), 4);
        assert_eq!(state.alive(), 4);
        assert_eq!(state.obstacles().len(), 1);
        assert_eq!(state.tick(), 0);
    }

    #[test]
    fn test_step_moves_to_running() {
        let evaluator = GenerationEvaluator::new(seeded()).unwrap();
        let mut state = evaluator.start(1, 0);
        let mut policies = vec![ConstantPolicy(0.0)];
        assert_eq!(evaluator.step(&mut state, &mut policies), None);
        assert_eq!(state.phase(), GenerationPhase::Running);
        assert_eq!(state.obstacles()[0].x, 695.0);
        let agent = &state.agents()[0];
        assert_eq!(agent.velocity, 0.5);
        assert_eq!(agent.position.y, 350.5);
        assert!((agent.fitness - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_tick_limit() {
        let config = SimConfig {
            tick_limit: Some(5),
            ..seeded()
        };
        let evaluator = GenerationEvaluator::new(config).unwrap();
        let mut policies = vec![ConstantPolicy(0.0)];
        let report = evaluator.evaluate(&mut policies, 0);
        assert_eq!(report.completion, CompletionReason::TickLimit);
        assert_eq!(report.ticks, 5);
        assert_eq!(report.outcomes[0].death, None);
        assert_eq!(report.outcomes[0].frames_survived, 5);
    }

    #[test]
    fn test_report_best_first_wins_ties() {
        let report = GenerationReport {
            generation_index: 0,
            fitnesses: vec![1.0, 3.0, 3.0, -1.0],
            outcomes: Vec::new(),
            ticks: 0,
            score: 0,
            completion: CompletionReason::AllDead,
            obstacles_spawned: 0,
        };
        assert_eq!(report.best(), Some((1, 3.0)));
        assert!((report.mean_fitness() - 1.5).abs() < 1e-12);
    }
}
