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

//! This module provides value iteration with the span based stopping rule.

use std::time::Instant;

use tracing::debug;

use crate::{Baseline, BaselineOutcome, Error, Mdp, MdpModel, Result};

use super::greedy_policy;

/// Value iteration: $v_{k+1} = \max_a R(\cdot,a) + \gamma P_a v_k$.
///
/// The iteration stops as soon as the span of $v_{k+1} - v_k$ falls below
/// $\epsilon (1 - \gamma) / \gamma$. At that point, shifting $v_{k+1}$ by
/// $\frac{\gamma}{1-\gamma}$ times the midpoint of that difference yields
/// values within $\epsilon$ of the optimum.
#[derive(Debug, Clone, Copy)]
pub struct ValueIteration {
    pub tolerance: f64,
    pub max_iterations: usize,
}
impl Default for ValueIteration {
    fn default() -> Self {
        ValueIteration { tolerance: 1e-9, max_iterations: 1_000_000 }
    }
}

impl Baseline for ValueIteration {
    fn solve(&self, model: &MdpModel) -> Result<BaselineOutcome> {
        let start = Instant::now();
        let gamma = model.discount();
        let threshold = self.tolerance * (1.0 - gamma) / gamma;

        let mut current = vec![0.0; model.nb_states()];
        let mut next = vec![0.0; model.nb_states()];
        for iteration in 1..=self.max_iterations {
            for s in model.states() {
                next[s.id()] = model.actions()
                    .map(|a| model.q_value(s, a, &current))
                    .fold(f64::NEG_INFINITY, f64::max);
            }

            let (lo, hi) = current.iter().zip(next.iter())
                .map(|(c, n)| n - c)
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| (lo.min(d), hi.max(d)));
            std::mem::swap(&mut current, &mut next);

            if hi - lo < threshold {
                debug!(iteration, "value iteration converged");
                let shift = gamma / (1.0 - gamma) * (lo + hi) / 2.0;
                let values = current.iter().map(|v| v + shift).collect::<Vec<_>>();
                return Ok(BaselineOutcome {
                    objective: model.expected_value(&values),
                    policy: greedy_policy(model, &values, self.tolerance),
                    values,
                    run_time: start.elapsed(),
                });
            }
        }
        Err(Error::IterationBudgetExceeded { iterations: self.max_iterations })
    }
}

#[cfg(test)]
mod tests {
    use crate::{Action, Baseline, Error, MdpModel, ValueIteration};
    use crate::test_utils::{assert_close, ties, toy, toy_values};

    #[test]
    fn value_iteration_finds_the_optimal_values() {
        let model = MdpModel::new(&toy()).unwrap();
        let outcome = ValueIteration::default().solve(&model).unwrap();
        let expected = toy_values();
        assert_close(expected[0], outcome.values[0], 1e-8);
        assert_close(expected[1], outcome.values[1], 1e-8);
        assert_eq!(vec![Action(0), Action(1)], outcome.policy);
    }
    #[test]
    fn ties_are_broken_in_favor_of_the_lowest_action() {
        let model = MdpModel::new(&ties(3)).unwrap();
        let outcome = ValueIteration::default().solve(&model).unwrap();
        assert_close(2.0, outcome.objective, 1e-8);
        assert_eq!(vec![Action(0)], outcome.policy);
    }
    #[test]
    fn the_iteration_budget_is_enforced() {
        let model = MdpModel::new(&toy()).unwrap();
        let vi = ValueIteration { tolerance: 1e-9, max_iterations: 2 };
        assert!(matches!(vi.solve(&model), Err(Error::IterationBudgetExceeded { iterations: 2 })));
    }
}
