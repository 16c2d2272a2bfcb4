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

//! A multi armed bandit (after Bertsimas and Misic). Each arm is a small
//! markov chain of its own and the joint state records the local state of
//! every arm. Pulling an arm moves that arm only and pays with its local
//! state.

use rand::{rngs::StdRng, SeedableRng};

use crate::{Action, Generator, Result, State, TabularMdp};

use super::{ensure, random_distribution, DEFAULT_DISCOUNT};

/// There are `nb_arms` arms with `nb_local_states` local states each, hence
/// `nb_local_states ^ nb_arms` joint states and one action per arm. Pulling
/// arm $a$ moves it along a random transition matrix drawn for that arm and
/// yields $10 x_a / n$ where $x_a$ is the local state of the arm and $n$ the
/// number of local states. The other arms do not move.
#[derive(Debug, Clone, Copy)]
pub struct BanditInstance {
    pub nb_arms: usize,
    pub nb_local_states: usize,
    pub discount: f64,
    pub seed: u64,
}
impl BanditInstance {
    pub fn new(nb_arms: usize, nb_local_states: usize, seed: u64) -> Self {
        BanditInstance { nb_arms, nb_local_states, discount: DEFAULT_DISCOUNT, seed }
    }
    /// The number of joint states
    pub fn nb_states(&self) -> usize {
        self.nb_local_states.pow(self.nb_arms as u32)
    }
    /// The joint state where arm `k` sits in `locals[k]`. The last arm is
    /// the one that varies fastest.
    pub fn state_of(&self, locals: &[usize]) -> State {
        State(locals.iter().fold(0, |acc, x| acc * self.nb_local_states + x))
    }
    /// The local state of every arm in the given joint state
    pub fn locals_of(&self, state: State) -> Vec<usize> {
        let mut locals = vec![0; self.nb_arms];
        let mut rest = state.id();
        for x in locals.iter_mut().rev() {
            *x = rest % self.nb_local_states;
            rest /= self.nb_local_states;
        }
        locals
    }
}

impl Generator for BanditInstance {
    fn generate(&self) -> Result<TabularMdp> {
        ensure(self.nb_arms >= 1, "a bandit needs at least one arm")?;
        ensure(self.nb_local_states >= 1, "every arm needs at least one state")?;
        ensure(
            (self.nb_local_states as f64).powi(self.nb_arms as i32) <= 1e6,
            "the bandit has too many joint states")?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let n = self.nb_local_states;
        let arms = (0..self.nb_arms)
            .map(|_| (0..n).map(|_| random_distribution(&mut rng, n)).collect::<Vec<_>>())
            .collect::<Vec<_>>();

        let nb_states = self.nb_states();
        let mut mdp = TabularMdp::new(nb_states, self.nb_arms, self.discount);
        for s in 0..nb_states {
            let state = State(s);
            let mut locals = self.locals_of(state);
            for (a, arm) in arms.iter().enumerate() {
                let current = locals[a];
                for (next, p) in arm[current].iter().enumerate() {
                    locals[a] = next;
                    mdp.set_transition(state, Action(a), self.state_of(&locals), *p);
                }
                locals[a] = current;
                mdp.set_reward(state, Action(a), 10.0 * current as f64 / n as f64);
            }
        }
        mdp.set_initial_distribution(&random_distribution(&mut rng, nb_states));
        Ok(mdp)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Action, BanditInstance, Generator, Mdp, MdpModel, State};
    use crate::test_utils::assert_close;

    #[test]
    fn a_bandit_is_a_proper_mdp() {
        let mdp = BanditInstance::new(3, 3, 5).generate().unwrap();
        let model = MdpModel::new(&mdp).unwrap();
        assert_eq!(27, model.nb_states());
        assert_eq!(3, model.nb_actions());
    }
    #[test]
    fn joint_states_are_numbered_with_the_last_arm_varying_fastest() {
        let bandit = BanditInstance::new(2, 3, 5);
        assert_eq!(State(5), bandit.state_of(&[1, 2]));
        assert_eq!(vec![1, 2], bandit.locals_of(State(5)));
        assert_eq!(vec![2, 0], bandit.locals_of(State(6)));
    }
    #[test]
    fn pulling_an_arm_leaves_the_others_in_place() {
        let bandit = BanditInstance::new(2, 3, 5);
        let mdp = bandit.generate().unwrap();
        let from = bandit.state_of(&[1, 2]);
        let mut moved = 0.0;
        for x in 0..3 {
            moved += mdp.transition(bandit.state_of(&[x, 2]), from, Action(0));
            assert_eq!(0.0, mdp.transition(bandit.state_of(&[x, 0]), from, Action(0)));
        }
        assert_close(1.0, moved, 1e-12);
    }
    #[test]
    fn the_pulled_arm_pays_with_its_local_state() {
        let bandit = BanditInstance::new(2, 4, 5);
        let mdp = bandit.generate().unwrap();
        let s = bandit.state_of(&[3, 1]);
        assert_close(7.5, mdp.reward(s, Action(0)), 1e-12);
        assert_close(2.5, mdp.reward(s, Action(1)), 1e-12);
    }
    #[test]
    fn a_bandit_without_arms_is_rejected() {
        assert!(BanditInstance::new(0, 3, 5).generate().is_err());
    }
}
