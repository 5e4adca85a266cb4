//! VICSEK - CLI Entry Point
//!
//! Headless collective motion simulator.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Instant;
use vicsek::stats::{export_agents_csv, Stats, StatsHistory};
use vicsek::sweep::{self, Experiment};
use vicsek::{benchmark, generate_from_config, AgentRanges, Config, UpdateMode};

#[derive(Parser)]
#[command(name = "vicsek")]
#[command(version)]
#[command(about = "Collective motion simulator with predators, leaders and field of view")]
struct Cli {
    /// Configuration file (YAML); defaults are used when it does not exist
    #[arg(short, long, global = true, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation
    Run {
        /// Number of steps (overrides the config)
        #[arg(short, long)]
        steps: Option<u64>,

        /// Output directory for stats and final agent states
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Update mode (overrides the config)
        #[arg(long, value_enum)]
        mode: Option<Mode>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Average the order parameter over repeated runs
    Sweep {
        #[arg(value_enum)]
        kind: SweepKind,

        /// Runs averaged per point
        #[arg(short, long, default_value = "5")]
        repetitions: usize,

        /// Largest noise level of a noise sweep
        #[arg(long, default_value = "5.0")]
        max_noise: f64,

        /// Noise increment of a noise sweep
        #[arg(long, default_value = "0.1")]
        noise_step: f64,

        /// Rounds of a density sweep
        #[arg(long, default_value = "100")]
        rounds: usize,

        /// CSV output file
        #[arg(short, long, default_value = "sweep.csv")]
        output: PathBuf,
    },

    /// Compare prey survival for extreme noise and fear values
    Predation {
        /// Number of predators
        #[arg(short, long, default_value = "2")]
        predators: usize,

        #[arg(short, long, default_value = "10")]
        repetitions: usize,

        /// Steps per run
        #[arg(short, long, default_value = "500")]
        steps: u64,

        /// CSV output file
        #[arg(short, long, default_value = "survival.csv")]
        output: PathBuf,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of steps
        #[arg(short, long, default_value = "200")]
        steps: u64,

        /// Population size
        #[arg(short, long, default_value = "1000")]
        population: usize,

        #[arg(long, value_enum, default_value = "sequential")]
        mode: Mode,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Sequential,
    Synchronous,
}

impl From<Mode> for UpdateMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Sequential => UpdateMode::Sequential,
            Mode::Synchronous => UpdateMode::Synchronous,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SweepKind {
    /// Order parameter against noise
    Noise,
    /// Order parameter against a growing density
    Density,
    /// Order parameter of unstepped groups against density
    Neutral,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.log_level.as_str()),
    )
    .init();

    match cli.command {
        Commands::Run {
            steps,
            output,
            seed,
            mode,
            quiet,
        } => run_simulation(config, steps, output, seed, mode, quiet),

        Commands::Sweep {
            kind,
            repetitions,
            max_noise,
            noise_step,
            rounds,
            output,
        } => run_sweep(
            &config,
            kind,
            repetitions,
            max_noise,
            noise_step,
            rounds,
            &output,
        ),

        Commands::Predation {
            predators,
            repetitions,
            steps,
            output,
        } => run_predation(&config, predators, repetitions, steps, &output),

        Commands::Benchmark {
            steps,
            population,
            mode,
        } => run_benchmark(steps, population, mode),

        Commands::Init { output } => generate_config(output),
    }
}

fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if path.exists() {
        Ok(Config::from_file(path)?)
    } else {
        Ok(Config::default())
    }
}

fn run_simulation(
    mut config: Config,
    steps: Option<u64>,
    output: PathBuf,
    seed: Option<u64>,
    mode: Option<Mode>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(s) = seed {
        log::info!("Using seed: {}", s);
        config.population.seed = Some(s);
    }
    if let Some(m) = mode {
        config.run.mode = m.into();
    }
    let steps = steps.unwrap_or(config.run.steps);

    std::fs::create_dir_all(&output)?;

    let mut group = generate_from_config(&config)?;
    let options = config.run.options();

    log::info!(
        "Starting simulation: {} agents, L = {}, {}D, {} steps, {:?} updates, seed {}",
        group.len(),
        group.domain_length(),
        group.dimension(),
        steps,
        options.mode,
        group.seed()
    );

    let mut history = StatsHistory::new(config.logging.stats_interval);
    if let Some(stats) = history.maybe_record(&group) {
        if !quiet {
            println!("{}", stats.summary());
        }
    }

    let start = Instant::now();
    for _ in 0..steps {
        group.step(&options);

        if let Some(stats) = history.maybe_record(&group) {
            if !quiet {
                println!("{}", stats.summary());
            }
        }

        if group.is_empty() {
            log::info!("Population extinct at step {}", group.time);
            break;
        }
    }

    let elapsed = start.elapsed();
    let final_stats = Stats::from_group(&group);

    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Steps: {}", group.time);
    println!(
        "Speed: {:.1} steps/s",
        group.time as f64 / elapsed.as_secs_f64()
    );
    println!("Final population: {}", final_stats.population);
    println!("Caught by predators: {}", final_stats.dead);
    println!("Order parameter: {:.4}", final_stats.order_parameter);

    let series = history.order_series();
    if !series.is_empty() {
        let mean = series.iter().map(|&(_, op)| op).sum::<f64>() / series.len() as f64;
        println!("Mean recorded order parameter: {:.4}", mean);
    }
    if let Some(mid) = history.get_at(group.time / 2) {
        println!("Midpoint (t = {}): {}", mid.time, mid.summary());
    }

    let stats_path = output.join("stats_history.json");
    history.save(&stats_path)?;
    println!("Stats history: {:?}", stats_path);

    let agents_path = output.join("agents_final.csv");
    export_agents_csv(group.agents(), &agents_path)?;
    println!("Final agents: {:?}", agents_path);

    Ok(())
}

fn run_sweep(
    config: &Config,
    kind: SweepKind,
    repetitions: usize,
    max_noise: f64,
    noise_step: f64,
    rounds: usize,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let experiment = Experiment::from_config(config, repetitions);
    let start = Instant::now();

    let (label, points) = match kind {
        SweepKind::Noise => {
            if noise_step.is_nan() || noise_step <= 0.0 {
                return Err("noise step must be > 0".into());
            }
            let levels = (max_noise / noise_step).floor().max(0.0) as usize;
            let noises: Vec<f64> = (0..=levels).map(|i| i as f64 * noise_step).collect();
            log::info!("Noise sweep: {} levels x {} runs", noises.len(), repetitions);
            ("noise", sweep::noise_sweep(&experiment, &noises)?)
        }
        SweepKind::Density => {
            log::info!("Density sweep: {} rounds x {} runs", rounds, repetitions);
            ("density", sweep::density_sweep(&experiment, rounds, 1)?)
        }
        SweepKind::Neutral => {
            let counts: Vec<usize> = (1..=rounds.max(1)).map(|i| i * 5).collect();
            log::info!("Neutral alignment: {} sizes x {} runs", counts.len(), repetitions);
            ("density", sweep::neutral_alignment(&experiment, &counts)?)
        }
    };

    for point in &points {
        println!("{:>10.4} | {:.4}", point.x, point.order_parameter);
    }
    sweep::write_sweep_csv(&points, label, output)?;

    log::info!("Sweep finished in {:.2}s", start.elapsed().as_secs_f64());
    println!("Results: {:?}", output);
    Ok(())
}

fn run_predation(
    config: &Config,
    predators: usize,
    repetitions: usize,
    steps: u64,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut experiment = Experiment::from_config(config, repetitions);
    experiment.steps = steps;

    log::info!(
        "Predation survival: {} prey, {} predators, {} steps x {} runs",
        experiment.count,
        predators,
        steps,
        repetitions
    );

    let predator_ranges: AgentRanges = config.predators;
    let rows = sweep::predation_survival(&experiment, predators, &predator_ranges)?;

    println!("noise | fear | survivors");
    for row in &rows {
        println!("{:<5} | {:<4} | {:.2}", row.noise, row.fear, row.survival);
    }
    sweep::write_survival_csv(&rows, output)?;
    println!("Results: {:?}", output);
    Ok(())
}

fn run_benchmark(steps: u64, population: usize, mode: Mode) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== VICSEK Benchmark ===");
    println!("Steps: {}", steps);
    println!("Population: {}", population);
    println!();

    let result = benchmark(steps, population, mode.into())?;
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}
