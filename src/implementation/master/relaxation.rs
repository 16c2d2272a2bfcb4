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

//! This module provides the master relaxation of the decomposition: the LP
//! formulation of the mdp where only the Bellman inequalities of the pool
//! are present.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use minilp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem, Solution, Variable};
use tracing::trace;

use crate::{Action, Cut, CutPool, Error, MdpModel, Result, State};

/// The default tolerance used to certify the solutions of the master
pub const DEFAULT_FEASIBILITY_TOLERANCE: f64 = 1e-7;

/// The optimal solution of the master at some iteration
#[derive(Debug, Clone, PartialEq)]
pub struct MasterSolution {
    /// The value of the variables (one per state)
    pub theta: Vec<f64>,
    /// $\sum_s \alpha_s \theta_s$
    pub objective: f64,
}

/// This is the master relaxation of the decomposition:
///
/// $\min \sum_s \alpha_s \theta_s$ subject to the cuts of the pool and to
/// $\theta_s \geq L$ for every state $s$.
///
/// The lower bound $L$ keeps the very first relaxation bounded. As long as
/// it is no larger than the smallest value of a state, it never cuts off
/// the optimal value function.
///
/// The cuts are accumulated forever: the relaxation only ever gets tighter.
/// Every call to `solve()` builds the lp afresh from the whole pool, and the
/// solution is certified against that pool before being handed to the
/// caller. The warm start of minilp is not reliable when the discount gets
/// close to one.
pub struct MasterRelaxation {
    initial: Vec<f64>,
    lower_bound: f64,
    feasibility_tolerance: f64,
    pool: CutPool,
    nb_solves: usize,
    solve_time: Duration,
}

impl MasterRelaxation {
    /// Builds a master without any cut for the given model.
    pub fn new(model: &MdpModel, lower_bound: f64, feasibility_tolerance: f64) -> Self {
        MasterRelaxation {
            initial: model.initial_distribution().to_vec(),
            lower_bound,
            feasibility_tolerance,
            pool: CutPool::new(model.nb_states(), model.nb_actions()),
            nb_solves: 0,
            solve_time: Duration::ZERO,
        }
    }

    /// Adds the half space of the given cut to the relaxation. It returns
    /// false (and leaves the relaxation untouched) when the cut of the same
    /// (state, action) pair has already been added.
    pub fn add_cut(&mut self, cut: Cut) -> bool {
        let (state, action) = (cut.state, cut.action);
        let added = self.pool.push(cut).is_some();
        if added {
            trace!(state = state.id(), action = action.id(), "cut added");
        }
        added
    }

    /// Solves the relaxation (with all the cuts added so far) to optimality.
    pub fn solve(&mut self) -> Result<MasterSolution> {
        self.nb_solves += 1;
        let iteration = self.nb_solves;

        let start = Instant::now();
        let (variables, problem) = self.problem();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| problem.solve()));
        self.solve_time += start.elapsed();

        let solution = match outcome {
            Ok(Ok(solution)) => solution,
            Ok(Err(minilp::Error::Infeasible)) => return Err(Error::Infeasible { iteration }),
            Ok(Err(minilp::Error::Unbounded)) => return Err(Error::Numerical {
                iteration,
                detail: "the master relaxation is unbounded".to_string(),
            }),
            Err(cause) => return Err(Error::Numerical {
                iteration,
                detail: format!("the lp solver aborted: {}", panic_message(cause.as_ref())),
            }),
        };

        let theta = variables.iter().map(|v| solution[*v]).collect::<Vec<_>>();
        let objective = self.certify(iteration, &theta, &solution)?;
        Ok(MasterSolution { theta, objective })
    }

    /// The lp made of the bounds on the variables and of every cut of the pool
    fn problem(&self) -> (Vec<Variable>, Problem) {
        let mut problem = Problem::new(OptimizationDirection::Minimize);
        let variables = self.initial.iter()
            .map(|alpha| problem.add_var(*alpha, (self.lower_bound, f64::INFINITY)))
            .collect::<Vec<_>>();
        for cut in self.pool.iter() {
            problem.add_constraint(expression(&variables, cut), ComparisonOp::Ge, cut.rhs);
        }
        (variables, problem)
    }

    /// The cuts added so far
    pub fn pool(&self) -> &CutPool {
        &self.pool
    }
    /// Returns true iff the cut of (state, action) has been added
    pub fn contains(&self, state: State, action: Action) -> bool {
        self.pool.contains(state, action)
    }
    /// The lower bound imposed on every variable
    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }
    /// The tolerance used when certifying solutions
    pub fn feasibility_tolerance(&self) -> f64 {
        self.feasibility_tolerance
    }
    /// The objective coefficients $\alpha$
    pub fn objective_coefficients(&self) -> &[f64] {
        &self.initial
    }
    /// The number of times the relaxation has been solved
    pub fn nb_solves(&self) -> usize {
        self.nb_solves
    }
    /// The cumulated time spent inside the lp solver
    pub fn solve_time(&self) -> Duration {
        self.solve_time
    }

    /// Checks that the solution returned by the lp solver is trustworthy and
    /// returns its objective value.
    fn certify(&self, iteration: usize, theta: &[f64], solution: &Solution) -> Result<f64> {
        let lp_objective = solution.objective();
        let tol = self.feasibility_tolerance;
        if let Some(s) = theta.iter().position(|t| !t.is_finite()) {
            return Err(Error::Numerical { iteration, detail: format!("theta_{s} is not finite") });
        }
        if let Some(s) = theta.iter().position(|t| *t < self.lower_bound - tol * (1.0 + self.lower_bound.abs())) {
            return Err(Error::Numerical { iteration, detail: format!("theta_{s} is below its lower bound") });
        }
        for cut in self.pool.iter() {
            let residual = cut.residual(theta);
            if residual < -tol * (1.0 + cut.rhs.abs()) {
                return Err(Error::Numerical {
                    iteration,
                    detail: format!("cut of state {} action {} is violated by {}",
                        cut.state.id(), cut.action.id(), -residual),
                });
            }
        }
        let objective = self.initial.iter().zip(theta.iter()).map(|(a, t)| a * t).sum::<f64>();
        if (objective - lp_objective).abs() > tol * (1.0 + objective.abs()) {
            return Err(Error::Numerical {
                iteration,
                detail: format!("objective {lp_objective} reported by the solver differs from {objective}"),
            });
        }
        Ok(objective)
    }
}

/// The text carried by a panic of the lp solver
fn panic_message(cause: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = cause.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = cause.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown cause".to_string()
    }
}

/// The left hand side of a cut, in terms of lp variables
fn expression(variables: &[Variable], cut: &Cut) -> LinearExpr {
    let mut expr = LinearExpr::empty();
    for (state, coefficient) in cut.coefficients.iter() {
        expr.add(variables[*state], *coefficient);
    }
    expr
}
