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

//! This module defines the `CutGenerator` trait: the subproblem solver of the
//! decomposition. Given the current value of the master variables, a cut
//! generator looks for the Bellman inequalities that are violated.

use crate::{Candidate, MdpModel, Policy, Result, State};

/// The result of one separation round.
#[derive(Debug, Clone, PartialEq)]
pub struct Separation {
    /// The best candidate found for each state (indexed by state)
    pub best: Vec<Candidate>,
    /// The states whose Bellman inequality is violated by more than the
    /// tolerance, in increasing order. The cut to add for such a state `s`
    /// is the one of `best[s.id()].action`.
    pub violated: Vec<State>,
    /// The number of Q-value evaluations performed to find the cuts
    pub evaluations: usize,
    /// The number of Q-value evaluations performed to certify that no cut
    /// was missed
    pub certification_evaluations: usize,
    /// True iff every action of every state has been looked at
    pub exhaustive: bool,
}
impl Separation {
    /// Returns true iff no Bellman inequality was found violated
    pub fn is_satisfied(&self) -> bool {
        self.violated.is_empty()
    }
}

/// This is the subproblem abstraction. A cut generator is a pure function of
/// the model and of the master solution `theta`: it must not mutate anything
/// and it may evaluate the states in any order (or concurrently).
///
/// Two strategies are provided: `FullScan` which looks at every action of
/// every state, and `MonotoneScan` which only looks at the actions that are
/// consistent with a non-decreasing policy.
pub trait CutGenerator {
    /// Computes, for each state, the action maximizing the right hand side of
    /// its Bellman inequality and reports the states where `theta` violates
    /// that inequality.
    fn separate(&self, model: &MdpModel, theta: &[f64]) -> Separation;

    /// Looks at every action of every state. The controller calls it before
    /// declaring convergence on a separation which was not exhaustive, hence
    /// generators restricting their search must make sure this one does not.
    fn certify(&self, model: &MdpModel, theta: &[f64]) -> Separation {
        self.separate(model, theta)
    }

    /// Recovers the policy once the decomposition has converged. `last` is
    /// the separation that proved convergence (it has no violated state).
    ///
    /// By default, the policy plays the best candidate of each state.
    fn extract_policy(&self, _model: &MdpModel, _theta: &[f64], last: &Separation) -> Result<Policy> {
        Ok(last.best.iter().map(|c| c.action).collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Action, Candidate, Separation, State};

    #[test]
    fn a_separation_without_violated_state_is_satisfied() {
        let sep = Separation {
            best: vec![Candidate { action: Action(0), value: 1.0 }],
            violated: vec![],
            evaluations: 1,
            certification_evaluations: 0,
            exhaustive: true,
        };
        assert!(sep.is_satisfied());
    }
    #[test]
    fn a_separation_with_violated_states_is_not_satisfied() {
        let sep = Separation {
            best: vec![Candidate { action: Action(0), value: 1.0 }],
            violated: vec![State(0)],
            evaluations: 1,
            certification_evaluations: 0,
            exhaustive: true,
        };
        assert!(!sep.is_satisfied());
    }
}
