// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! This example generates an instance of one of the benchmark families and
//! solves it with the decomposition. Optionally, it cross checks the outcome
//! against policy iteration and writes the final master to disk.
//!
//! Set `RUST_LOG=benders_mdp=debug` to follow the iterations.

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context};
use benders_mdp::{BanditInstance, Baseline, DecompositionOptionsBuilder, ExhaustiveLp, Generator, InventoryInstance,
    MdpModel, PolicyIteration, QueueInstance, RandomInstance, ReplacementInstance, Seeding, Strategy, TabularMdp,
    TransmissionInstance, ValueIteration, decompose};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// This structure uses `clap-derive` annotations and define the arguments that can
/// be passed on to the executable.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The benchmark family to generate an instance from
    #[command(subcommand)]
    family: Family,
    /// The seed of the instance generator
    #[clap(short, long, default_value = "42")]
    seed: u64,
    /// The discount factor of the instance
    #[clap(short, long, default_value = "0.999")]
    discount: f64,
    /// Restrict the cut generation to monotone policies
    #[clap(short, long)]
    monotone: bool,
    /// Start with one cut per state (the myopic one) instead of none
    #[clap(long)]
    myopic: bool,
    /// The tolerance under which a Bellman inequality is deemed satisfied
    #[clap(short, long, default_value = "1e-6")]
    tolerance: f64,
    /// The maximum amount of time (in seconds) you would like the decomposition to run
    #[clap(long)]
    timeout: Option<u64>,
    /// The maximum number of master solves
    #[clap(long)]
    max_iterations: Option<usize>,
    /// The number of threads used to generate the cuts (all cores by default)
    #[clap(long)]
    threads: Option<usize>,
    /// Cross check the outcome with a classical algorithm
    #[clap(short, long, value_enum)]
    baseline: Option<Check>,
    /// The directory where `master.lp` and `solution.json` are written
    #[clap(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Family {
    /// Dense random transitions and rewards
    Random { states: usize, actions: usize },
    /// Single server queue with controllable service rate
    Queue {
        states: usize,
        actions: usize,
        #[clap(default_value = "0.2")]
        arrival: f64,
    },
    /// Multi armed bandit, one action per arm
    Bandit { arms: usize, arm_states: usize },
    /// Single item inventory with poisson demand
    Inventory { capacity: usize },
    /// Machine maintenance (its optimal policy is monotone)
    Replacement { states: usize, actions: usize },
    /// Packet transmission over a fading channel
    Transmission { channels: usize, packets: usize, efforts: usize },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Check {
    PolicyIteration,
    ValueIteration,
    Lp,
}

impl Family {
    fn generate(self, seed: u64, discount: f64) -> benders_mdp::Result<TabularMdp> {
        match self {
            Family::Random { states, actions } => {
                let mut g = RandomInstance::new(states, actions, seed);
                g.discount = discount;
                g.generate()
            }
            Family::Queue { states, actions, arrival } => {
                let mut g = QueueInstance::new(states, actions, arrival, seed);
                g.discount = discount;
                g.generate()
            }
            Family::Bandit { arms, arm_states } => {
                let mut g = BanditInstance::new(arms, arm_states, seed);
                g.discount = discount;
                g.generate()
            }
            Family::Inventory { capacity } => {
                let mut g = InventoryInstance::new(capacity, seed);
                g.discount = discount;
                g.generate()
            }
            Family::Replacement { states, actions } => {
                let mut g = ReplacementInstance::new(states, actions, seed);
                g.discount = discount;
                g.generate()
            }
            Family::Transmission { channels, packets, efforts } => {
                let mut g = TransmissionInstance::new(channels, packets, efforts, seed);
                g.discount = discount;
                g.generate()
            }
        }
    }
}

/// This is your executable's entry point. It is the place where all the pieces are put together
/// to generate an instance and decompose it.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mdp = args.family.generate(args.seed, args.discount)
        .context("could not generate the instance")?;
    let model = MdpModel::new(&mdp).context("the generated instance is invalid")?;

    let mut options = DecompositionOptionsBuilder::default();
    options
        .tolerance(args.tolerance)
        .strategy(if args.monotone { Strategy::Monotone } else { Strategy::Unrestricted })
        .seeding(if args.myopic { Seeding::Myopic } else { Seeding::Empty });
    if let Some(secs) = args.timeout {
        options.time_limit(Duration::from_secs(secs));
    }
    if let Some(max) = args.max_iterations {
        options.max_iterations(max);
    }
    if let Some(threads) = args.threads {
        options.nb_threads(threads);
    }
    if let Some(dir) = &args.output {
        options.output_dir(dir.clone());
    }
    let options = options.build()?;

    let outcome = decompose(&model, &options)?;

    println!("States:     {}",            model.nb_states());
    println!("Actions:    {}",            model.nb_actions());
    println!("Duration:   {:.3} seconds", outcome.run_time.as_secs_f32());
    println!("LP time:    {:.3} seconds", outcome.solve_time.as_secs_f32());
    println!("Objective:  {}",            outcome.objective);
    println!("Iterations: {}",            outcome.iterations);
    println!("Cuts:       {}",            outcome.nb_cuts);
    println!("Evals:      {}",            outcome.evaluations);
    println!("Cert evals: {}",            outcome.certification_evaluations);
    println!("Policy:     {:?}",          outcome.policy.iter().map(|a| a.id()).collect::<Vec<_>>());

    if let Some(check) = args.baseline {
        let baseline: Box<dyn Baseline> = match check {
            Check::PolicyIteration => Box::<PolicyIteration>::default(),
            Check::ValueIteration  => Box::<ValueIteration>::default(),
            Check::Lp              => Box::<ExhaustiveLp>::default(),
        };
        let reference = baseline.solve(&model)?;
        let gap = (reference.objective - outcome.objective).abs();
        println!("Baseline:   {}",            reference.objective);
        println!("Base time:  {:.3} seconds", reference.run_time.as_secs_f32());
        println!("Gap:        {:e}",          gap);
        if gap > 1e-4 * (1.0 + reference.objective.abs()) {
            bail!("the decomposition disagrees with the baseline ({gap:e})");
        }
    }
    Ok(())
}
