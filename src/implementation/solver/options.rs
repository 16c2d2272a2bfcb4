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

//! This module defines the knobs one can turn to tune a decomposition.

use std::{path::PathBuf, time::Duration};

use derive_builder::Builder;

use crate::{DEFAULT_FEASIBILITY_TOLERANCE, DEFAULT_TOLERANCE};

/// How the cut generator is allowed to look for violated inequalities
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Strategy {
    /// Every action of every state is considered (`FullScan`)
    #[default]
    Unrestricted,
    /// Only the actions consistent with a non-decreasing policy are
    /// considered, and convergence is certified by an exhaustive pass
    /// (`MonotoneScan`)
    Monotone,
}

/// Which cuts are present in the master before its first resolution
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Seeding {
    /// The master starts with no cut at all: only the lower bounds hold
    #[default]
    Empty,
    /// The master starts with one cut per state: the one of the action
    /// having the largest immediate reward
    Myopic,
}

/// This is how you configure a decomposition. The defaults are those of
/// `DecompositionOptions::default()`.
///
/// # Example
/// ```
/// # use benders_mdp::*;
/// use std::time::Duration;
///
/// let options = DecompositionOptionsBuilder::default()
///     .strategy(Strategy::Monotone)
///     .time_limit(Duration::from_secs(60))
///     .build()
///     .unwrap();
/// assert_eq!(Strategy::Monotone, options.strategy);
/// assert_eq!(None, options.max_iterations);
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(default)]
pub struct DecompositionOptions {
    /// A Bellman inequality is only deemed violated when $\theta_s$ falls
    /// short of its right hand side by more than this tolerance
    pub tolerance: f64,
    /// The maximum number of times the master may be solved. When absent,
    /// $|S| \times |A| + 1$ solves are allowed, which is enough for the
    /// decomposition to add every possible cut and solve the full lp.
    #[builder(setter(strip_option))]
    pub max_iterations: Option<usize>,
    /// The maximum wall-clock duration of the decomposition
    #[builder(setter(strip_option))]
    pub time_limit: Option<Duration>,
    /// The cut generation strategy
    pub strategy: Strategy,
    /// The number of threads evaluating the states of the mdp
    pub nb_threads: usize,
    /// The cuts present in the very first master
    pub seeding: Seeding,
    /// The tolerance used to certify the solutions of the master
    pub feasibility_tolerance: f64,
    /// The lower bound imposed on every variable of the master. When
    /// absent, $\min_{s,a} R(s,a) / (1 - \gamma)$ is used.
    #[builder(setter(strip_option))]
    pub theta_lower_bound: Option<f64>,
    /// The directory where the final master (`master.lp`) and its solution
    /// (`solution.json`) are written upon convergence
    #[builder(setter(into, strip_option))]
    pub output_dir: Option<PathBuf>,
}

impl Default for DecompositionOptions {
    fn default() -> Self {
        DecompositionOptions {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: None,
            time_limit: None,
            strategy: Strategy::default(),
            nb_threads: num_cpus::get(),
            seeding: Seeding::default(),
            feasibility_tolerance: DEFAULT_FEASIBILITY_TOLERANCE,
            theta_lower_bound: None,
            output_dir: None,
        }
    }
}
