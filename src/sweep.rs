//! Aggregate experiments driving many independent groups.
//!
//! Every repetition gets its own seed drawn from the experiment's base seed,
//! so a sweep is reproducible regardless of how rayon schedules the jobs.

use crate::agent::AgentKind;
use crate::config::Config;
use crate::error::Result;
use crate::generator::{generate_agent, generate_group, AgentRanges, ParamRange};
use crate::group::{Group, PredationConfig, RunOptions};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Prey (noise, fear) combinations compared by [`predation_survival`]
pub const PREY_CASES: [(f64, f64); 4] = [(1.0, 0.0), (0.0, 1.0), (1.0, 1.0), (0.0, 0.0)];

/// Shared setup of a repeated experiment
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    /// Agents generated per trial
    pub count: usize,
    pub ranges: AgentRanges,
    pub domain_length: f64,
    pub dimension: usize,
    /// Steps run per trial (per round for [`density_sweep`])
    pub steps: u64,
    pub options: RunOptions,
    pub predation: PredationConfig,
    /// Trials averaged per point
    pub repetitions: usize,
    pub seed: u64,
}

impl Default for Experiment {
    fn default() -> Self {
        Self {
            count: 40,
            ranges: AgentRanges {
                position: ParamRange::new(-1.5, 1.5),
                speed: ParamRange::new(-1.0, 1.0),
                ..AgentRanges::default()
            },
            domain_length: 3.1,
            dimension: 2,
            steps: 100,
            options: RunOptions {
                use_field_of_view: false,
                use_walls: false,
                ..RunOptions::default()
            },
            predation: PredationConfig::default(),
            repetitions: 5,
            seed: 0,
        }
    }
}

impl Experiment {
    /// Experiment mirroring a simulation configuration
    pub fn from_config(config: &Config, repetitions: usize) -> Self {
        Self {
            count: config.population.count,
            ranges: config.agents,
            domain_length: config.population.domain_length,
            dimension: config.population.dimension,
            steps: config.run.steps,
            options: config.run.options(),
            predation: config.predation,
            repetitions,
            seed: config.population.seed.unwrap_or(0),
        }
    }

    fn repetitions(&self) -> usize {
        self.repetitions.max(1)
    }

    /// `points × repetitions` jobs as (point, seed), point-major
    fn jobs(&self, points: usize) -> Vec<(usize, u64)> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        (0..points)
            .flat_map(|p| std::iter::repeat(p).take(self.repetitions()))
            .map(|p| (p, rng.gen()))
            .collect()
    }

    /// Fresh group of `count` agents drawn from `ranges`
    fn trial(&self, ranges: &AgentRanges, count: usize, seed: u64) -> Result<Group> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let group = generate_group(&mut rng, count, ranges, self.domain_length, self.dimension)?;
        Ok(group.with_predation(self.predation))
    }
}

/// One averaged point of an order parameter curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    /// Swept quantity (noise or density)
    pub x: f64,
    pub order_parameter: f64,
}

/// Prey survival for one (noise, fear) combination
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurvivalRow {
    pub noise: f64,
    pub fear: f64,
    /// Fraction of prey alive at the end, averaged over repetitions
    pub survival: f64,
}

/// Order parameter after `steps` steps, for each noise level
pub fn noise_sweep(experiment: &Experiment, noises: &[f64]) -> Result<Vec<SweepPoint>> {
    let samples = experiment
        .jobs(noises.len())
        .into_par_iter()
        .map(|(point, seed)| -> Result<f64> {
            let ranges = AgentRanges {
                noise: ParamRange::fixed(noises[point]),
                ..experiment.ranges
            };
            let mut group = experiment.trial(&ranges, experiment.count, seed)?;
            group.run_with(experiment.steps, &experiment.options);
            Ok(group.order_parameter())
        })
        .collect::<Result<Vec<f64>>>()?;

    let points = samples
        .chunks(experiment.repetitions())
        .zip(noises)
        .map(|(chunk, &noise)| SweepPoint {
            x: noise,
            order_parameter: mean(chunk),
        })
        .collect();
    Ok(points)
}

/// Grow a group by `added_per_round` agents per round, running `steps`
/// steps after each addition. Yields one point per round.
pub fn density_sweep(
    experiment: &Experiment,
    rounds: usize,
    added_per_round: usize,
) -> Result<Vec<SweepPoint>> {
    let runs = experiment
        .jobs(1)
        .into_par_iter()
        .map(|(_, seed)| -> Result<Vec<(f64, f64)>> {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut group = experiment.trial(&experiment.ranges, experiment.count, rng.gen())?;
            let mut curve = Vec::with_capacity(rounds);
            for _ in 0..rounds {
                for _ in 0..added_per_round {
                    let agent = generate_agent(
                        &mut rng,
                        &experiment.ranges,
                        AgentKind::Normal,
                        experiment.dimension,
                    )?;
                    group.add_agent(&agent)?;
                }
                group.run_with(experiment.steps, &experiment.options);
                curve.push((group.density(), group.order_parameter()));
            }
            Ok(curve)
        })
        .collect::<Result<Vec<Vec<(f64, f64)>>>>()?;

    let points = (0..rounds)
        .map(|round| {
            let densities: Vec<f64> = runs.iter().map(|r| r[round].0).collect();
            let orders: Vec<f64> = runs.iter().map(|r| r[round].1).collect();
            SweepPoint {
                x: mean(&densities),
                order_parameter: mean(&orders),
            }
        })
        .collect();
    Ok(points)
}

/// Order parameter of freshly generated groups, without stepping, for each
/// population size. The baseline alignment of random headings.
pub fn neutral_alignment(experiment: &Experiment, counts: &[usize]) -> Result<Vec<SweepPoint>> {
    let samples = experiment
        .jobs(counts.len())
        .into_par_iter()
        .map(|(point, seed)| -> Result<(f64, f64)> {
            let group = experiment.trial(&experiment.ranges, counts[point], seed)?;
            Ok((group.density(), group.order_parameter()))
        })
        .collect::<Result<Vec<(f64, f64)>>>()?;

    let points = samples
        .chunks(experiment.repetitions())
        .map(|chunk| {
            let densities: Vec<f64> = chunk.iter().map(|s| s.0).collect();
            let orders: Vec<f64> = chunk.iter().map(|s| s.1).collect();
            SweepPoint {
                x: mean(&densities),
                order_parameter: mean(&orders),
            }
        })
        .collect();
    Ok(points)
}

/// Prey survival under `predators` hunters for each of [`PREY_CASES`].
///
/// Each repetition builds one base group and forks it per case, so all four
/// cases start from the same positions.
pub fn predation_survival(
    experiment: &Experiment,
    predators: usize,
    predator_ranges: &AgentRanges,
) -> Result<Vec<SurvivalRow>> {
    let prey_count = experiment.count;
    let runs = experiment
        .jobs(1)
        .into_par_iter()
        .map(|(_, seed)| -> Result<Vec<f64>> {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut base = experiment.trial(&experiment.ranges, prey_count, rng.gen())?;
            for _ in 0..predators {
                let hunter = generate_agent(
                    &mut rng,
                    predator_ranges,
                    AgentKind::Predator,
                    experiment.dimension,
                )?;
                base.add_agent(&hunter)?;
            }

            let survival = PREY_CASES
                .iter()
                .map(|&(noise, fear)| {
                    let mut group = base.fork(rng.gen());
                    for agent in group.agents_mut() {
                        if !agent.kind.is_predator() {
                            agent.noise = noise;
                            agent.fear = fear;
                        }
                    }
                    group.run_with(experiment.steps, &experiment.options);
                    if prey_count == 0 {
                        1.0
                    } else {
                        1.0 - group.dead_count() as f64 / prey_count as f64
                    }
                })
                .collect::<Vec<f64>>();
            Ok(survival)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let rows = PREY_CASES
        .iter()
        .enumerate()
        .map(|(case, &(noise, fear))| {
            let values: Vec<f64> = runs.iter().map(|r| r[case]).collect();
            SurvivalRow {
                noise,
                fear,
                survival: mean(&values),
            }
        })
        .collect();
    Ok(rows)
}

/// Write a curve as two-column CSV
pub fn write_sweep_csv<P: AsRef<Path>>(
    points: &[SweepPoint],
    x_label: &str,
    path: P,
) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "{},order_parameter", x_label)?;
    for point in points {
        writeln!(file, "{:.6},{:.6}", point.x, point.order_parameter)?;
    }
    Ok(())
}

pub fn write_survival_csv<P: AsRef<Path>>(rows: &[SurvivalRow], path: P) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "noise,fear,survival")?;
    for row in rows {
        writeln!(file, "{},{},{:.4}", row.noise, row.fear, row.survival)?;
    }
    Ok(())
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
