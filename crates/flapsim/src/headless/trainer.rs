//! Training environment
//!
//! Main loop: ask the population for policies, evaluate one generation,
//! report fitness back, then track the best policy and checkpoint it.

use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use flapsim_core::{
    CompletionReason, GenerationEvaluator, GenerationReport, PolicyPopulation, TickObserver,
    TickSnapshot,
};

use crate::config::AppConfig;

use super::checkpoint::{BestTracker, CheckpointRecord, CheckpointStore};
use super::population::SampledPopulation;

/// Configuration for the training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of generations to run
    pub generations: usize,
    /// Population size per generation
    pub population_size: usize,
    /// Hidden neurons per sampled network
    pub hidden_neurons: usize,
    /// How often to save checkpoints (every N generations, 0 = never)
    pub checkpoint_interval: usize,
    /// Also checkpoint the first time the best policy passes this many pipes
    pub score_checkpoint: Option<u32>,
    /// Stop once the best fitness reaches this value
    pub fitness_threshold: Option<f64>,
    /// Seed for the sampled policies
    pub seed: Option<u64>,
    /// Output directory for checkpoints and stats
    pub output_dir: String,
    /// Trace a tick snapshot every N ticks (0 = off)
    pub trace_ticks: u64,
    /// Show a progress bar
    pub progress: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            generations: 100,
            population_size: 50,
            hidden_neurons: 6,
            checkpoint_interval: 10,
            score_checkpoint: Some(20),
            fitness_threshold: None,
            seed: None,
            output_dir: "training_output".to_string(),
            trace_ticks: 0,
            progress: true,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.generations > 0, "generations must be at least 1");
        ensure!(self.population_size > 0, "population_size must be at least 1");
        ensure!(self.hidden_neurons > 0, "hidden_neurons must be at least 1");
        if let Some(threshold) = self.fitness_threshold {
            ensure!(
                threshold.is_finite(),
                "fitness_threshold must be finite, got {}",
                threshold
            );
        }
        Ok(())
    }
}

/// Statistics of one generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    pub generation: usize,
    /// Best fitness this generation
    pub best_fitness: f64,
    /// Best fitness over the whole run
    pub best_overall: f64,
    pub mean_fitness: f64,
    pub ticks: u64,
    pub score: u32,
    pub completion: CompletionReason,
    pub checkpoint: Option<PathBuf>,
}

/// Logs a compact line every `every` ticks
struct TickTracer {
    every: u64,
}

impl TickObserver for TickTracer {
    fn on_tick(&mut self, snapshot: &TickSnapshot<'_>) {
        if snapshot.tick % self.every != 0 {
            return;
        }
        let best = snapshot
            .agents
            .iter()
            .map(|a| a.fitness)
            .fold(f64::NEG_INFINITY, f64::max);
        log::trace!(
            "Gen {} tick {}: alive={}, score={}, obstacles={}, ground={:.0}, best={:.2}",
            snapshot.generation_index,
            snapshot.tick,
            snapshot.alive(),
            snapshot.score,
            snapshot.obstacles.len(),
            snapshot.ground_offset,
            best
        );
    }
}

/// Main training environment
pub struct TrainingEnv<P: PolicyPopulation = SampledPopulation> {
    config: AppConfig,
    evaluator: GenerationEvaluator,
    population: P,
    store: CheckpointStore,
    tracker: BestTracker,
    score_checkpoint_reached: bool,
    /// Statistics history
    pub stats_history: Vec<TrainingStats>,
}

impl TrainingEnv<SampledPopulation> {
    /// Environment drawing fresh random networks every generation
    pub fn sampled(config: AppConfig) -> Result<Self> {
        let population = SampledPopulation::new(
            config.training.population_size,
            config.training.hidden_neurons,
            config.training.seed,
        );
        Self::new(config, population)
    }
}

impl<P: PolicyPopulation> TrainingEnv<P> {
    pub fn new(config: AppConfig, population: P) -> Result<Self> {
        config.training.validate()?;
        let evaluator = GenerationEvaluator::new(config.sim.clone())
            .context("Invalid simulation configuration")?;
        let store = CheckpointStore::new(&config.training.output_dir);
        Ok(Self {
            config,
            evaluator,
            population,
            store,
            tracker: BestTracker::default(),
            score_checkpoint_reached: false,
            stats_history: Vec::new(),
        })
    }

    pub fn best(&self) -> Option<&CheckpointRecord> {
        self.tracker.best()
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    pub fn population(&self) -> &P {
        &self.population
    }

    fn progress_style() -> Result<ProgressStyle> {
        Ok(ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("=>-"))
    }

    pub fn run(&mut self) -> Result<()> {
        let training = self.config.training.clone();

        let pb = if training.progress {
            ProgressBar::new(training.generations as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(Self::progress_style()?);
        pb.suspend(|| {
            log::info!(
                "Starting training: {} generations, {} population, seed {:?}",
                training.generations,
                training.population_size,
                self.config.sim.seed
            )
        });

        for generation in 0..training.generations {
            let report = self.run_generation(generation)?;
            let stats = self.record(generation, &report)?;

            pb.suspend(|| {
                log::info!(
                    "Gen {}: best={:.2}, mean={:.2}, overall={:.2}, score={}, ticks={} ({:?})",
                    generation,
                    stats.best_fitness,
                    stats.mean_fitness,
                    stats.best_overall,
                    stats.score,
                    stats.ticks,
                    stats.completion
                )
            });
            pb.set_message(format!("best {:.1}", stats.best_overall));
            pb.inc(1);

            let done = training
                .fitness_threshold
                .is_some_and(|threshold| stats.best_overall >= threshold);
            self.stats_history.push(stats);
            if done {
                pb.suspend(|| {
                    log::info!("Reached fitness threshold after generation {}", generation)
                });
                break;
            }
        }

        pb.finish_with_message("Training complete");
        self.write_stats()
    }

    fn run_generation(&mut self, generation: usize) -> Result<GenerationReport> {
        let index = generation as u64;
        let mut policies = self.population.policies(index);
        ensure!(
            !policies.is_empty(),
            "population returned no policies for generation {}",
            generation
        );

        let report = match self.config.training.trace_ticks {
            0 => self.evaluator.evaluate(&mut policies, index),
            every => {
                let mut tracer = TickTracer { every };
                self.evaluator
                    .evaluate_observed(&mut policies, index, &mut tracer)
            }
        };
        self.population.report_fitness(index, &report.fitnesses);
        Ok(report)
    }

    /// Update the cumulative best and checkpoint when due
    fn record(&mut self, generation: usize, report: &GenerationReport) -> Result<TrainingStats> {
        let (best_index, best_fitness) = report
            .best()
            .context("Generation produced no fitness values")?;
        let pipes = report.outcomes[best_index].pipes_passed;

        let population = &self.population;
        let improved = self.tracker.offer(generation, best_fitness, pipes, || {
            population
                .export_policy(best_index)
                .context("Failed to export best policy")
        })?;
        if improved {
            log::debug!(
                "New best at generation {}: fitness {:.2}, {} pipes",
                generation,
                best_fitness,
                pipes
            );
        }

        let interval = self.config.training.checkpoint_interval;
        let interval_due = interval > 0 && generation % interval == 0;
        let score_due = !self.score_checkpoint_reached
            && self
                .config
                .training
                .score_checkpoint
                .is_some_and(|target| self.tracker.pipes_passed() >= target);
        if score_due {
            self.score_checkpoint_reached = true;
            log::info!(
                "Best policy passed {} pipes at generation {}",
                self.tracker.pipes_passed(),
                generation
            );
        }

        let checkpoint = match self.tracker.best() {
            Some(best) if interval_due || score_due => {
                Some(self.store.save(generation, best, self.tracker.pipes_passed())?)
            }
            _ => None,
        };

        Ok(TrainingStats {
            generation,
            best_fitness,
            best_overall: self.tracker.best_fitness().unwrap_or(best_fitness),
            mean_fitness: report.mean_fitness(),
            ticks: report.ticks,
            score: report.score,
            completion: report.completion,
            checkpoint,
        })
    }

    fn write_stats(&self) -> Result<()> {
        let dir = PathBuf::from(&self.config.training.output_dir);
        std::fs::create_dir_all(&dir).context("Failed to create output directory")?;
        let json = serde_json::to_string_pretty(&self.stats_history)
            .context("Failed to serialize training stats")?;
        let path = dir.join("stats.json");
        std::fs::write(&path, json).context("Failed to write training stats")?;
        log::info!("Wrote {}", path.display());
        Ok(())
    }
}
