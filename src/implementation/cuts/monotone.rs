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

//! This module provides the cut generator which assumes that some optimal
//! policy is monotone: states and actions are both totally ordered by their
//! index and the action played never decreases when the state increases.
//!
//! Under that assumption, once the best action $a^*$ of some state $s$ is
//! known, the states below $s$ only need to consider the actions up to $a^*$
//! and the states above $s$ only need to consider the actions from $a^*$ on.
//! Processing the states in a divide and conquer fashion (middle state first)
//! thus keeps the number of Q-value evaluations close to
//! $O((|S| + |A|) \log |S|)$ instead of $|S| \times |A|$.
//!
//! Because the restriction may hide a violated inequality whenever the
//! assumption does not hold, a round which finds no violation is always
//! followed by an exhaustive certification pass.

use crate::{Action, CutGenerator, Error, FullScan, Mdp, MdpModel, Policy, Result, Separation, State};

use super::best_in_window;

/// A contiguous range of states `[first, end)` which may only consider the
/// actions `lo..=hi`.
#[derive(Debug, Clone, Copy)]
struct Window {
    first: usize,
    end: usize,
    lo: usize,
    hi: usize,
}

/// The cut generator exploiting the monotonicity of an optimal policy.
#[derive(Debug, Clone)]
pub struct MonotoneScan {
    tolerance: f64,
    certifier: FullScan,
}

impl MonotoneScan {
    pub fn new(tolerance: f64) -> Self {
        MonotoneScan { tolerance, certifier: FullScan::new(tolerance) }
    }
    /// Sets the number of threads used by the certification pass
    pub fn with_nb_threads(mut self, nb_threads: usize) -> Self {
        self.certifier = self.certifier.with_nb_threads(nb_threads);
        self
    }
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Scans every state over its restricted window of actions.
    fn restricted(&self, model: &MdpModel, theta: &[f64]) -> Separation {
        let nb_states = model.nb_states();
        let mut best = vec![None; nb_states];
        let mut maxima = vec![f64::NEG_INFINITY; nb_states];
        let mut evaluations = 0;
        let mut values = Vec::with_capacity(model.nb_actions());

        let mut fringe = vec![Window { first: 0, end: nb_states, lo: 0, hi: model.nb_actions() - 1 }];
        while let Some(w) = fringe.pop() {
            if w.first >= w.end {
                continue;
            }
            let mid = (w.first + w.end) / 2;
            let (cand, max) = best_in_window(model, State(mid), theta, w.lo, w.hi, self.tolerance, &mut values);
            evaluations += w.hi - w.lo + 1;
            best[mid] = Some(cand);
            maxima[mid] = max;

            let pivot = cand.action.id();
            fringe.push(Window { first: mid + 1, end: w.end, lo: pivot, hi: w.hi });
            fringe.push(Window { first: w.first, end: mid, lo: w.lo, hi: pivot });
        }

        let violated = maxima.iter().enumerate()
            .filter(|(s, max)| super::is_violated(theta, State(*s), **max, self.tolerance))
            .map(|(s, _)| State(s))
            .collect();

        Separation {
            // every state is the middle of exactly one window
            best: best.into_iter().flatten().collect(),
            violated,
            evaluations,
            certification_evaluations: 0,
            exhaustive: false,
        }
    }
}

impl CutGenerator for MonotoneScan {
    fn separate(&self, model: &MdpModel, theta: &[f64]) -> Separation {
        let restricted = self.restricted(model, theta);
        if !restricted.is_satisfied() {
            return restricted;
        }

        let certified = self.certify(model, theta);
        Separation { evaluations: restricted.evaluations, ..certified }
    }

    fn certify(&self, model: &MdpModel, theta: &[f64]) -> Separation {
        let full = self.certifier.separate(model, theta);
        Separation {
            evaluations: 0,
            certification_evaluations: full.evaluations,
            ..full
        }
    }

    /// Greedily picks, for each state in increasing order, the smallest
    /// optimal action that is not smaller than the one of the previous
    /// state. This fails iff no optimal policy is monotone.
    fn extract_policy(&self, model: &MdpModel, theta: &[f64], _last: &Separation) -> Result<Policy> {
        let mut policy = Vec::with_capacity(model.nb_states());
        let mut floor = 0;
        let mut values = Vec::with_capacity(model.nb_actions());
        for s in model.states() {
            values.clear();
            values.extend(model.actions().map(|a| model.q_value(s, a, theta)));
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

            let chosen = (floor..model.nb_actions())
                .find(|a| values[*a] >= max - self.tolerance)
                .ok_or(Error::MonotoneAssumptionViolated { state: s.id() })?;

            floor = chosen;
            policy.push(Action(chosen));
        }
        Ok(policy)
    }
}
