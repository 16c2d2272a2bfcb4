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

//! Machine maintenance (after Puterman). State 0 is a brand new machine and
//! the higher the state, the worse the machine. Action 0 lets the machine
//! run as is, while the larger actions are more expensive maintenance
//! operations with a higher chance to restore the machine as new.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{Action, Generator, Result, State, TabularMdp};

use super::{ensure, DEFAULT_DISCOUNT};

/// When left alone, a machine in state $i$ deteriorates to $i + 1$ with
/// probability $q_i$ (the worst state is absorbing). Maintenance $a$
/// restores the machine with probability $p_a$ (increasing in $a$, and
/// $p_0 = 0$), after which it deteriorates like a new machine:
///
/// $P(\cdot|i,a) = p_a D(\cdot|0) + (1 - p_a) D(\cdot|i)$
///
/// The reward is $C - c a - C_i$ where the operating costs $C_i$ increase
/// with the state. These instances are built so that the optimal policy
/// is monotone: the worse the machine, the heavier the maintenance.
#[derive(Debug, Clone, Copy)]
pub struct ReplacementInstance {
    pub nb_states: usize,
    pub nb_actions: usize,
    pub discount: f64,
    pub seed: u64,
}
impl ReplacementInstance {
    pub fn new(nb_states: usize, nb_actions: usize, seed: u64) -> Self {
        ReplacementInstance { nb_states, nb_actions, discount: DEFAULT_DISCOUNT, seed }
    }
}

impl Generator for ReplacementInstance {
    fn generate(&self) -> Result<TabularMdp> {
        ensure(self.nb_states >= 1 && self.nb_actions >= 1, "a machine needs states and actions")?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let n = self.nb_states;
        let m = self.nb_actions;

        let deteriorate = (0..n)
            .map(|i| if i + 1 < n { rng.gen_range(0.2..0.8) } else { 0.0 })
            .collect::<Vec<f64>>();
        let mut restore = (1..m).map(|_| rng.gen_range(0.05..1.0)).collect::<Vec<f64>>();
        restore.sort_by(f64::total_cmp);
        restore.insert(0, 0.0);

        let reward = 0.5 * n as f64;
        let repair = 0.1 * n as f64;
        let mut operating = (0..n).map(|_| rng.gen_range(0.0..0.75 * n as f64)).collect::<Vec<f64>>();
        operating.sort_by(f64::total_cmp);

        let mut mdp = TabularMdp::new(n, m, self.discount);
        for i in 0..n {
            for (a, p) in restore.iter().enumerate() {
                let (s, action) = (State(i), Action(a));
                // p D(.|0)
                mdp.add_transition(s, action, State(0), p * (1.0 - deteriorate[0]));
                if n > 1 {
                    mdp.add_transition(s, action, State(1), p * deteriorate[0]);
                }
                // (1 - p) D(.|i)
                mdp.add_transition(s, action, State(i), (1.0 - p) * (1.0 - deteriorate[i]));
                if i + 1 < n {
                    mdp.add_transition(s, action, State(i + 1), (1.0 - p) * deteriorate[i]);
                }
                mdp.set_reward(s, action, reward - repair * a as f64 - operating[i]);
            }
            mdp.set_initial(State(i), 1.0 / n as f64);
        }
        Ok(mdp)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Action, Baseline, Generator, Mdp, MdpModel, PolicyIteration, ReplacementInstance, State};

    #[test]
    fn a_machine_is_a_proper_mdp() {
        let mdp = ReplacementInstance::new(10, 4, 5).generate().unwrap();
        assert!(MdpModel::new(&mdp).is_ok());
    }
    #[test]
    fn doing_nothing_never_improves_the_machine() {
        let mdp = ReplacementInstance::new(6, 3, 5).generate().unwrap();
        for i in 1..6 {
            for j in 0..i {
                assert_eq!(0.0, mdp.transition(State(j), State(i), Action(0)));
            }
        }
    }
    #[test]
    fn maintenance_is_more_expensive_than_doing_nothing() {
        let mdp = ReplacementInstance::new(6, 3, 5).generate().unwrap();
        assert!(mdp.reward(State(2), Action(2)) < mdp.reward(State(2), Action(0)));
        assert!(mdp.reward(State(4), Action(0)) <= mdp.reward(State(2), Action(0)));
    }
    #[test]
    fn the_optimal_policy_is_monotone() {
        for seed in 0..5 {
            let mut instance = ReplacementInstance::new(15, 5, seed);
            instance.discount = 0.95;
            let model = MdpModel::new(&instance.generate().unwrap()).unwrap();
            let outcome = PolicyIteration::default().solve(&model).unwrap();
            // the policy of policy iteration may differ on ties, only the
            // greedy lowest-index one is guaranteed monotone
            let policy = crate::implementation::baseline::greedy_policy(&model, &outcome.values, 1e-7);
            assert!(policy.windows(2).all(|w| w[0] <= w[1]), "seed {seed}: {policy:?}");
        }
    }
}
