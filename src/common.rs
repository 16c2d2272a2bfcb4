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

//! This module defines the most basic data types that are used throughout all
//! the code of our library (both at the abstraction and implementation levels).
//! These are also the types your client code is likely to work with.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

// ----------------------------------------------------------------------------
// --- STATE ------------------------------------------------------------------
// ----------------------------------------------------------------------------
/// This type denotes a state of the markov decision process at hand. States
/// carry no information but their index: each state is identified with an
/// integer ranging from 0 until `mdp.nb_states()`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize)]
pub struct State(pub usize);
impl State {
    #[inline]
    /// This function returns the id (numeric value) of the state.
    ///
    /// # Examples:
    /// ```
    /// # use benders_mdp::State;
    /// assert_eq!(0, State(0).id());
    /// assert_eq!(7, State(7).id());
    /// ```
    pub fn id(self) -> usize {
        self.0
    }
}

// ----------------------------------------------------------------------------
// --- ACTION -----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// This type denotes an action of the markov decision process. The action set
/// is the same in every state, so an action is just an integer ranging from 0
/// until `mdp.nb_actions()`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize)]
pub struct Action(pub usize);
impl Action {
    #[inline]
    /// This function returns the id (numeric value) of the action.
    ///
    /// # Examples:
    /// ```
    /// # use benders_mdp::Action;
    /// assert_eq!(0, Action(0).id());
    /// assert_eq!(3, Action(3).id());
    /// ```
    pub fn id(self) -> usize {
        self.0
    }
}

/// A policy maps each state (by index) onto the action it plays.
pub type Policy = Vec<Action>;

// ----------------------------------------------------------------------------
// --- CANDIDATE --------------------------------------------------------------
// ----------------------------------------------------------------------------
/// The best action a cut generator found for one state, along with the value
/// of the right hand side of the corresponding Bellman inequality:
/// $R(s,a) + \gamma \sum_{s'} P(s'|s,a) \theta_{s'}$.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Candidate {
    /// The action whose cut is proposed
    pub action: Action,
    /// The right hand side of the Bellman inequality for that action
    pub value: f64,
}

// ----------------------------------------------------------------------------
// --- Results ----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// The phases a decomposition goes through.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Phase {
    /// The master has not been built yet
    Init,
    /// The master is being solved and tightened with cuts
    Iterating,
    /// No Bellman inequality is violated anymore (terminal)
    Converged,
    /// The run stopped because of an error or a budget (terminal)
    Failed,
}

/// What happened during one iteration of the decomposition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationRecord {
    /// The 1-based index of the iteration
    pub iteration: usize,
    /// The objective of the master relaxation at this iteration
    pub objective: f64,
    /// The number of states whose Bellman inequality was violated
    pub violated: usize,
    /// The number of cuts that were added to the master after this iteration
    pub new_cuts: usize,
    /// The time spent inside the lp solver during this iteration
    pub solve_time: Duration,
}

/// The outcome of a successful decomposition.
#[derive(Debug, Clone, Serialize)]
pub struct Decomposed {
    /// The optimal objective value: $\sum_s \alpha_s \theta_s$
    pub objective: f64,
    /// The final value of the master variables (the optimal value function
    /// on every state having a positive initial probability)
    pub theta: Vec<f64>,
    /// The policy recovered from the last cut generation pass. It is
    /// optimal (up to the tolerance) on the states it reaches from the
    /// support of the initial distribution. Elsewhere theta may exceed the
    /// value function and the action is only greedy with respect to theta.
    pub policy: Policy,
    /// Wall-clock time of the whole decomposition
    pub run_time: Duration,
    /// Time spent exclusively inside the lp solver
    pub solve_time: Duration,
    /// Number of times the master relaxation has been solved
    pub iterations: usize,
    /// Number of cuts present in the master at convergence
    pub nb_cuts: usize,
    /// Number of Q-value evaluations performed by the cut generator
    pub evaluations: usize,
    /// Number of Q-value evaluations spent on certification passes (only the
    /// monotone generator performs such passes)
    pub certification_evaluations: usize,
    /// One record per master solve, in chronological order
    pub history: Vec<IterationRecord>,
}

// ----------------------------------------------------------------------------
// --- Errors -----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// Everything that can go wrong while building a model or decomposing it.
/// Each of these is a terminal outcome for the run that produced it.
#[derive(Debug, Error)]
pub enum Error {
    /// The mdp does not describe a proper discounted markov decision process
    #[error("malformed instance: {0}")]
    MalformedInstance(String),
    /// The master relaxation has no feasible solution
    #[error("master relaxation is infeasible (iteration {iteration})")]
    Infeasible { iteration: usize },
    /// The lp solver could not be trusted to have found the optimum
    #[error("numerical failure at iteration {iteration}: {detail}")]
    Numerical { iteration: usize, detail: String },
    /// The configured maximum number of iterations was reached
    #[error("no convergence within {iterations} iterations")]
    IterationBudgetExceeded { iterations: usize },
    /// The configured time budget elapsed before convergence
    #[error("time budget exhausted after {iterations} iterations")]
    TimeBudgetExceeded { iterations: usize },
    /// The monotone variant ran on an instance without monotone optimal policy
    #[error("no monotone optimal policy: state {state} cannot play an action at least as large as its predecessor's")]
    MonotoneAssumptionViolated { state: usize },
    /// The diagnostics could not be written
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The solution could not be serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;


// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_ids {
    use crate::{Action, State};

    #[test]
    fn test_state_id() {
        assert_eq!(0, State(0).id());
        assert_eq!(1, State(1).id());
        assert_eq!(2, State(2).id());
    }
    #[test]
    fn test_action_id() {
        assert_eq!(0, Action(0).id());
        assert_eq!(1, Action(1).id());
        assert_eq!(2, Action(2).id());
    }
    #[test]
    fn states_are_ordered_by_index() {
        assert!(State(1) < State(2));
        assert!(Action(0) < Action(5));
    }
}
