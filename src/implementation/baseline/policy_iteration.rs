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

//! This module provides Howard's policy iteration where each policy is
//! evaluated exactly by solving the linear system $(I - \gamma P_\pi) v = r_\pi$.

use std::time::Instant;

use tracing::debug;

use crate::{Action, Baseline, BaselineOutcome, Error, Mdp, MdpModel, Result};

use super::greedy_policy;

/// Policy iteration. A state only switches to another action when that
/// action improves its Q-value by more than the tolerance: this is what
/// guarantees the termination of the algorithm in spite of rounding errors.
#[derive(Debug, Clone, Copy)]
pub struct PolicyIteration {
    pub tolerance: f64,
}
impl Default for PolicyIteration {
    fn default() -> Self {
        PolicyIteration { tolerance: 1e-9 }
    }
}

impl Baseline for PolicyIteration {
    fn solve(&self, model: &MdpModel) -> Result<BaselineOutcome> {
        let start = Instant::now();
        let mut policy = greedy_policy(model, &vec![0.0; model.nb_states()], self.tolerance);
        let mut rounds = 0;
        loop {
            rounds += 1;
            let values = evaluate(model, &policy)?;

            let mut stable = true;
            for s in model.states() {
                let current = model.q_value(s, policy[s.id()], &values);
                let mut best = (policy[s.id()], current);
                for a in model.actions() {
                    let q = model.q_value(s, a, &values);
                    if q > best.1 + self.tolerance {
                        best = (a, q);
                    }
                }
                if best.0 != policy[s.id()] {
                    policy[s.id()] = best.0;
                    stable = false;
                }
            }

            if stable {
                debug!(rounds, "policy iteration converged");
                return Ok(BaselineOutcome {
                    objective: model.expected_value(&values),
                    values,
                    policy,
                    run_time: start.elapsed(),
                });
            }
        }
    }
}

/// Computes the value of each state under the given policy by Gaussian
/// elimination with partial pivoting.
pub fn evaluate(model: &MdpModel, policy: &[Action]) -> Result<Vec<f64>> {
    let n = model.nb_states();
    let gamma = model.discount();

    // augmented matrix [I - gamma P | r], row major
    let width = n + 1;
    let mut m = vec![0.0; n * width];
    for s in model.states() {
        let a = policy[s.id()];
        let row = &mut m[s.id() * width..(s.id() + 1) * width];
        row[s.id()] = 1.0;
        let (targets, probabilities) = model.successors(s, a);
        for (t, p) in targets.iter().zip(probabilities.iter()) {
            row[*t] -= gamma * p;
        }
        row[n] = model.reward_of(s, a);
    }

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|x, y| m[x * width + col].abs().total_cmp(&m[y * width + col].abs()))
            .unwrap_or(col);
        if m[pivot * width + col].abs() < 1e-12 {
            return Err(Error::Numerical {
                iteration: 0,
                detail: format!("singular policy evaluation system at column {col}"),
            });
        }
        if pivot != col {
            for k in 0..width {
                m.swap(pivot * width + k, col * width + k);
            }
        }
        let diag = m[col * width + col];
        for row in col + 1..n {
            let factor = m[row * width + col] / diag;
            if factor != 0.0 {
                for k in col..width {
                    m[row * width + k] -= factor * m[col * width + k];
                }
            }
        }
    }

    let mut values = vec![0.0; n];
    for row in (0..n).rev() {
        let mut acc = m[row * width + n];
        for k in row + 1..n {
            acc -= m[row * width + k] * values[k];
        }
        values[row] = acc / m[row * width + row];
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use crate::{Action, Baseline, MdpModel, PolicyIteration};
    use crate::test_utils::{assert_close, decreasing_chain, toy, toy_values};

    use super::evaluate;

    #[test]
    fn the_evaluation_of_a_policy_solves_the_bellman_equations() {
        let model = MdpModel::new(&toy()).unwrap();
        // v0 = 1 + 0.9 (0.9 v0 + 0.1 v1) ; v1 = 0.9 (0.5 v0 + 0.5 v1)
        let values = evaluate(&model, &[Action(0), Action(0)]).unwrap();
        assert_close(1.0 + 0.9 * (0.9 * values[0] + 0.1 * values[1]), values[0], 1e-9);
        assert_close(0.9 * (0.5 * values[0] + 0.5 * values[1]), values[1], 1e-9);
    }
    #[test]
    fn policy_iteration_finds_the_optimal_values() {
        let model = MdpModel::new(&toy()).unwrap();
        let outcome = PolicyIteration::default().solve(&model).unwrap();
        let expected = toy_values();
        assert_close(expected[0], outcome.values[0], 1e-9);
        assert_close(expected[1], outcome.values[1], 1e-9);
        assert_eq!(vec![Action(0), Action(1)], outcome.policy);
        assert_close(0.5 * expected[0] + 0.5 * expected[1], outcome.objective, 1e-9);
    }
    #[test]
    fn policy_iteration_is_not_bothered_by_a_decreasing_policy() {
        let model = MdpModel::new(&decreasing_chain(4)).unwrap();
        let outcome = PolicyIteration::default().solve(&model).unwrap();
        assert_close(8.0, outcome.values[0], 1e-9);
        assert_close(6.0, outcome.values[3], 1e-9);
        assert_eq!(Action(1), outcome.policy[0]);
        assert_eq!(Action(0), outcome.policy[3]);
    }
}
