//! Integration tests for whole generations
//!
//! These drive the evaluator end to end through its public API, watching
//! individual ticks through the observer hook where a property has to hold
//! at every step rather than only at the end.

use std::collections::HashSet;

use flapsim_core::{
    AgentOutcome, CompletionReason, ConstantPolicy, DeathCause, FnPolicy, GenerationEvaluator, Observation,
    Policy, PolicyError, SimConfig, TickObserver, TickSnapshot,
};

fn seeded(seed: u64) -> SimConfig {
    SimConfig {
        seed: Some(seed),
        ..Default::default()
    }
}

/// Course with gap centers confined to 325..405, easy enough for a simple
/// follower to survive indefinitely
fn gentle(seed: u64) -> SimConfig {
    SimConfig {
        gap_margin: 250.0,
        tick_limit: Some(1_000),
        ..seeded(seed)
    }
}

/// Jump whenever the agent's top is within `margin` of the gap's lower edge
fn follower(margin: f32) -> FnPolicy<impl FnMut(&Observation) -> f32 + Send> {
    FnPolicy(move |obs: &Observation| if obs.to_gap_bottom() < margin { 1.0 } else { 0.0 })
}

/// Jumps on the first tick and every tenth tick after that
fn periodic_jumper() -> FnPolicy<impl FnMut(&Observation) -> f32 + Send> {
    let mut calls = 0_u64;
    FnPolicy(move |_: &Observation| {
        let jump = calls % 10 == 0;
        calls += 1;
        if jump { 1.0 } else { 0.0 }
    })
}

/// Returns 0.0 until call `n`, where it panics
fn panics_on_call(n: u32) -> FnPolicy<impl FnMut(&Observation) -> f32 + Send> {
    let mut calls = 0;
    FnPolicy(move |_: &Observation| {
        calls += 1;
        if calls == n {
            panic!("diverged");
        }
        0.0
    })
}

struct Erroring;

impl Policy for Erroring {
    fn decide(&mut self, _: &Observation) -> Result<f32, PolicyError> {
        Err(PolicyError::Failed("no weights".into()))
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

// ============================================================================
// Observers
// ============================================================================

/// Checks that fitness only ever grows, apart from one penalty on death
struct FitnessWatch {
    penalty: f64,
    previous: Vec<f64>,
    deaths_seen: Vec<bool>,
    ticks: u64,
}

impl FitnessWatch {
    fn new(agents: usize, penalty: f64) -> Self {
        Self {
            penalty,
            previous: vec![0.0; agents],
            deaths_seen: vec![false; agents],
            ticks: 0,
        }
    }
}

impl TickObserver for FitnessWatch {
    fn on_tick(&mut self, snapshot: &TickSnapshot<'_>) {
        self.ticks += 1;
        assert_eq!(snapshot.tick, self.ticks);
        for agent in snapshot.agents {
            let i = agent.index;
            let before = self.previous[i];
            if agent.is_alive() {
                assert!(agent.fitness > before, "agent {i} alive but fitness fell");
            } else if agent.death_tick == Some(snapshot.tick) {
                assert!(!self.deaths_seen[i], "agent {i} died twice");
                self.deaths_seen[i] = true;
                let expected = match agent.death_cause() {
                    Some(DeathCause::PolicyFault) => before,
                    _ => before - self.penalty,
                };
                assert_close(agent.fitness, expected);
            } else {
                assert_eq!(agent.fitness, before, "agent {i} changed after death");
            }
            self.previous[i] = agent.fitness;
        }
    }
}

/// Records every obstacle pair's gap, in spawn order
#[derive(Default)]
struct CourseRecorder {
    seen: HashSet<u32>,
    gaps: Vec<(u32, f32)>,
}

impl TickObserver for CourseRecorder {
    fn on_tick(&mut self, snapshot: &TickSnapshot<'_>) {
        for pair in snapshot.obstacles {
            if self.seen.insert(pair.id) {
                self.gaps.push((pair.id, pair.gap_center));
            }
        }
    }
}

/// Checks that each live agent has earned exactly one bonus per pair behind it
struct PassWatch {
    agent_x: f32,
    behind: HashSet<u32>,
}

impl TickObserver for PassWatch {
    fn on_tick(&mut self, snapshot: &TickSnapshot<'_>) {
        for pair in snapshot.obstacles {
            if pair.x < self.agent_x {
                self.behind.insert(pair.id);
            }
        }
        for agent in snapshot.agents.iter().filter(|a| a.is_alive()) {
            assert_eq!(agent.pipes_passed as usize, self.behind.len());
        }
    }
}

// ============================================================================
// Fitness accounting
// ============================================================================

#[test]
fn test_fitness_monotone_except_death_penalty() {
    let config = seeded(3);
    let evaluator = GenerationEvaluator::new(config.clone()).unwrap();
    let mut policies: Vec<Box<dyn Policy>> = vec![
        Box::new(ConstantPolicy(0.0)),
        Box::new(ConstantPolicy(1.0)),
        Box::new(periodic_jumper()),
        Box::new(follower(40.0)),
        Box::new(ConstantPolicy(f32::INFINITY)),
    ];
    let mut watch = FitnessWatch::new(policies.len(), config.collision_penalty);
    let report = evaluator.evaluate_observed(&mut policies, 0, &mut watch);

    assert_eq!(watch.ticks, report.ticks);
    for outcome in &report.outcomes {
        if outcome.death.is_some() {
            assert!(watch.deaths_seen[outcome.index]);
        }
    }
}

#[test]
fn test_never_jumping_agent_hits_floor() {
    let evaluator = GenerationEvaluator::new(seeded(5)).unwrap();
    let mut policies = vec![ConstantPolicy(0.0)];
    let report = evaluator.evaluate(&mut policies, 0);

    // 350 + 0.25 * n * (n + 1) until terminal velocity, then 10 px per tick
    let outcome = &report.outcomes[0];
    assert_eq!(report.completion, CompletionReason::AllDead);
    assert_eq!(outcome.death, Some(DeathCause::Floor));
    assert_eq!(outcome.death_tick, Some(46));
    assert_eq!(outcome.frames_survived, 45);
    assert_close(outcome.fitness, 0.1 * 45.0 - 1.0);
    assert_eq!(report.ticks, 46);
}

#[test]
fn test_periodic_jumper_scenario() {
    let config = seeded(8);
    assert_eq!(config.gravity, 0.5);
    assert_eq!(config.jump_velocity, -7.0);
    assert_eq!(config.gap_height, 150.0);
    assert_eq!(config.obstacle_spacing, 300.0);
    assert_eq!(config.scroll_speed, 5.0);

    let evaluator = GenerationEvaluator::new(config).unwrap();
    let mut policies = vec![periodic_jumper()];
    let report = evaluator.evaluate(&mut policies, 0);

    // Every 10-tick cycle nets 47.5 px upward; the ceiling comes before
    // the first pair reaches the agent on tick 88
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.death, Some(DeathCause::Ceiling));
    assert_eq!(outcome.death_tick, Some(84));
    assert!(outcome.frames_survived >= 60);
    assert_eq!(outcome.frames_survived, 83);
    assert_eq!(outcome.pipes_passed, 0);
    assert_close(
        outcome.fitness,
        0.1 * outcome.frames_survived as f64 + 5.0 * outcome.pipes_passed as f64 - 1.0,
    );
}

#[test]
fn test_pass_bonus_once_per_pair() {
    let config = gentle(21);
    let evaluator = GenerationEvaluator::new(config.clone()).unwrap();
    let mut policies = vec![follower(40.0), follower(45.0), follower(50.0)];
    let mut watch = PassWatch {
        agent_x: config.agent_x,
        behind: HashSet::new(),
    };
    let report = evaluator.evaluate_observed(&mut policies, 0, &mut watch);

    assert_eq!(report.completion, CompletionReason::TickLimit);
    assert!(report.score >= 10);
    for outcome in &report.outcomes {
        assert_eq!(outcome.death, None);
        assert_eq!(outcome.frames_survived, 1_000);
        assert_eq!(outcome.pipes_passed, report.score);
        assert!(outcome.pipes_passed <= report.obstacles_spawned);
        assert_close(
            outcome.fitness,
            0.1 * 1_000.0 + 5.0 * outcome.pipes_passed as f64,
        );
    }
}

#[test]
fn test_score_ceiling_ends_generation() {
    let config = SimConfig {
        score_ceiling: Some(3),
        ..gentle(4)
    };
    let evaluator = GenerationEvaluator::new(config).unwrap();
    let mut policies = vec![follower(40.0)];
    let report = evaluator.evaluate(&mut policies, 0);

    assert_eq!(report.completion, CompletionReason::ScoreCeiling);
    assert_eq!(report.score, 3);
    assert_eq!(report.outcomes[0].pipes_passed, 3);
    assert_eq!(report.outcomes[0].death, None);
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_fixed_seed_is_reproducible() {
    let run = || {
        let evaluator = GenerationEvaluator::new(seeded(99)).unwrap();
        let mut policies: Vec<Box<dyn Policy>> = vec![
            Box::new(follower(40.0)),
            Box::new(periodic_jumper()),
            Box::new(ConstantPolicy(0.0)),
        ];
        let mut course = CourseRecorder::default();
        let report = evaluator.evaluate_observed(&mut policies, 2, &mut course);
        (report, course.gaps)
    };

    let (first, first_course) = run();
    let (second, second_course) = run();
    assert_eq!(first, second);
    assert_eq!(first_course, second_course);
    assert!(!first_course.is_empty());
}

#[test]
fn test_generation_index_changes_course() {
    let evaluator = GenerationEvaluator::new(gentle(99)).unwrap();
    let course = |generation_index| {
        let mut policies = vec![follower(40.0)];
        let mut recorder = CourseRecorder::default();
        evaluator.evaluate_observed(&mut policies, generation_index, &mut recorder);
        recorder.gaps
    };
    assert_ne!(course(0), course(1));
    assert_eq!(course(1), course(1));
}

#[test]
fn test_course_independent_of_population_size() {
    let evaluator = GenerationEvaluator::new(seeded(17)).unwrap();

    let mut solo = vec![ConstantPolicy(0.0)];
    let alone = evaluator.evaluate(&mut solo, 0);

    let mut crowd = vec![ConstantPolicy(0.0); 64];
    let together = evaluator.evaluate(&mut crowd, 0);

    for outcome in &together.outcomes {
        assert_eq!(outcome.fitness, alone.outcomes[0].fitness);
        assert_eq!(outcome.death_tick, alone.outcomes[0].death_tick);
    }
}

#[test]
fn test_agent_outcome_independent_of_flockmates() {
    // Same result with or without the parallel feature:
    // cargo test -p flapsim-core --no-default-features
    let config = SimConfig {
        score_ceiling: None,
        ..gentle(21)
    };
    let evaluator = GenerationEvaluator::new(config).unwrap();
    let roster = || -> Vec<Box<dyn Policy>> {
        vec![
            Box::new(follower(40.0)),
            Box::new(periodic_jumper()),
            Box::new(ConstantPolicy(0.0)),
            Box::new(panics_on_call(7)),
            Box::new(follower(50.0)),
            Box::new(ConstantPolicy(f32::NAN)),
            Box::new(Erroring),
            Box::new(ConstantPolicy(1.0)),
        ]
    };

    let mut flock = roster();
    let together = evaluator.evaluate(&mut flock, 0);
    assert_eq!(together.completion, CompletionReason::TickLimit);

    for (i, outcome) in together.outcomes.iter().enumerate() {
        let mut solo = vec![roster().swap_remove(i)];
        let alone = evaluator.evaluate(&mut solo, 0);
        let expected = AgentOutcome {
            index: i,
            ..alone.outcomes[0].clone()
        };
        assert_eq!(*outcome, expected, "agent {i} depends on the rest of the flock");
    }
}

// ============================================================================
// Edge cases
// ============================================================================

#[test]
fn test_empty_policy_list() {
    let evaluator = GenerationEvaluator::new(seeded(1)).unwrap();
    let mut policies: Vec<FnPolicy<fn(&Observation) -> f32>> = Vec::new();
    let report = evaluator.evaluate(&mut policies, 7);
    assert_eq!(report.completion, CompletionReason::Empty);
    assert_eq!(report.generation_index, 7);
    assert!(report.fitnesses.is_empty());
    assert!(report.outcomes.is_empty());
}

#[test]
fn test_policy_faults_are_isolated() {
    let evaluator = GenerationEvaluator::new(seeded(12)).unwrap();
    let mut policies: Vec<Box<dyn Policy>> = vec![
        Box::new(ConstantPolicy(0.0)),
        Box::new(panics_on_call(5)),
        Box::new(ConstantPolicy(f32::NAN)),
        Box::new(Erroring),
    ];
    let report = evaluator.evaluate(&mut policies, 0);

    let panicked = &report.outcomes[1];
    assert_eq!(panicked.death, Some(DeathCause::PolicyFault));
    assert_eq!(panicked.death_tick, Some(5));
    assert_eq!(panicked.frames_survived, 4);
    assert_close(panicked.fitness, 0.4);

    for faulty in &report.outcomes[2..] {
        assert_eq!(faulty.death, Some(DeathCause::PolicyFault));
        assert_eq!(faulty.death_tick, Some(1));
        assert_eq!(faulty.fitness, 0.0);
    }

    let mut solo = vec![ConstantPolicy(0.0)];
    let alone = evaluator.evaluate(&mut solo, 0);
    assert_eq!(report.outcomes[0], alone.outcomes[0]);
}

#[test]
fn test_best_reports_fittest_agent() {
    let evaluator = GenerationEvaluator::new(seeded(6)).unwrap();
    let mut policies: Vec<Box<dyn Policy>> = vec![
        Box::new(ConstantPolicy(f32::NAN)),
        Box::new(ConstantPolicy(0.0)),
        Box::new(periodic_jumper()),
    ];
    let report = evaluator.evaluate(&mut policies, 0);
    let (index, fitness) = report.best().unwrap();
    assert_eq!(index, 2);
    assert_eq!(fitness, report.fitnesses[2]);
}
