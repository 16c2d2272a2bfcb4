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

//! This module provides the cuts and the append-only pool that stores them.

use crate::{Action, MdpModel, State};

/// A Bellman cut: the inequality
/// $\theta_s \geq R(s,a) + \gamma \sum_{s'} P(s'|s,a) \theta_{s'}$
/// written as $\sum_{s'} c_{s'} \theta_{s'} \geq R(s, a)$ where
/// $c_s = 1 - \gamma P(s|s,a)$ and $c_{s'} = -\gamma P(s'|s,a)$ otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Cut {
    /// The state whose value is bounded by this cut
    pub state: State,
    /// The action this cut stems from
    pub action: Action,
    /// The nonzero coefficients of the left hand side, sorted by state
    pub coefficients: Vec<(usize, f64)>,
    /// The right hand side: $R(s, a)$
    pub rhs: f64,
}
impl Cut {
    /// Creates the Bellman cut of the given (state, action) pair
    pub fn bellman(model: &MdpModel, state: State, action: Action) -> Self {
        let gamma = model.discount();
        let (targets, probabilities) = model.successors(state, action);

        let mut coefficients = Vec::with_capacity(targets.len() + 1);
        let mut diagonal = false;
        for (next, p) in targets.iter().zip(probabilities.iter()) {
            if *next == state.id() {
                coefficients.push((*next, 1.0 - gamma * p));
                diagonal = true;
            } else {
                if !diagonal && *next > state.id() {
                    coefficients.push((state.id(), 1.0));
                    diagonal = true;
                }
                coefficients.push((*next, -gamma * p));
            }
        }
        if !diagonal {
            coefficients.push((state.id(), 1.0));
        }

        Cut { state, action, coefficients, rhs: model.reward_of(state, action) }
    }
    /// Returns the value of the left hand side minus the right hand side at
    /// `theta`. It is nonnegative iff `theta` satisfies the cut.
    pub fn residual(&self, theta: &[f64]) -> f64 {
        let lhs = self.coefficients.iter().map(|(s, c)| c * theta[*s]).sum::<f64>();
        lhs - self.rhs
    }
}

/// The identifier of a cut in the pool (its rank of insertion)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CutId(pub usize);

/// The cut pool is an append-only arena of cuts, indexed by (state, action).
/// Cuts are never removed, and a given (state, action) pair is stored at
/// most once. Hence the pool never holds more than $|S| \times |A|$ cuts.
#[derive(Debug, Clone)]
pub struct CutPool {
    nb_actions: usize,
    index: Vec<Option<CutId>>,
    cuts: Vec<Cut>,
}
impl CutPool {
    pub fn new(nb_states: usize, nb_actions: usize) -> Self {
        CutPool { nb_actions, index: vec![None; nb_states * nb_actions], cuts: vec![] }
    }
    /// Returns true iff the cut of (state, action) already is in the pool
    pub fn contains(&self, state: State, action: Action) -> bool {
        self.index[self.slot(state, action)].is_some()
    }
    /// Returns the id of the cut of (state, action) if it is in the pool
    pub fn find(&self, state: State, action: Action) -> Option<CutId> {
        self.index[self.slot(state, action)]
    }
    /// Appends the given cut to the pool and returns its id. Nothing is
    /// added (and `None` is returned) when the pool already holds the cut of
    /// the same (state, action) pair.
    pub fn push(&mut self, cut: Cut) -> Option<CutId> {
        let slot = self.slot(cut.state, cut.action);
        if self.index[slot].is_some() {
            return None;
        }
        let id = CutId(self.cuts.len());
        self.index[slot] = Some(id);
        self.cuts.push(cut);
        Some(id)
    }
    pub fn get(&self, id: CutId) -> &Cut {
        &self.cuts[id.0]
    }
    pub fn len(&self) -> usize {
        self.cuts.len()
    }
    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }
    /// Iterates over the cuts in their order of insertion
    pub fn iter(&self) -> impl Iterator<Item = &Cut> {
        self.cuts.iter()
    }
    /// Iterates over the actions whose cut has been added for `state`
    pub fn actions_of(&self, state: State) -> impl Iterator<Item = Action> + '_ {
        let start = state.id() * self.nb_actions;
        self.index[start..start + self.nb_actions].iter()
            .enumerate()
            .filter(|(_, id)| id.is_some())
            .map(|(a, _)| Action(a))
    }

    #[inline]
    fn slot(&self, state: State, action: Action) -> usize {
        state.id() * self.nb_actions + action.id()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Action, Cut, CutId, CutPool, MdpModel, State};
    use crate::test_utils::{assert_close, toy};

    #[test]
    fn the_bellman_cut_moves_the_discounted_expectation_to_the_left() {
        let model = MdpModel::new(&toy()).unwrap();
        let cut = Cut::bellman(&model, State(0), Action(1));
        assert_eq!(State(0), cut.state);
        assert_eq!(Action(1), cut.action);
        assert_eq!(0.0, cut.rhs);
        assert_eq!(2, cut.coefficients.len());
        assert_eq!(0, cut.coefficients[0].0);
        assert_close(1.0 - 0.9 * 0.2, cut.coefficients[0].1, 1e-12);
        assert_eq!(1, cut.coefficients[1].0);
        assert_close(-0.9 * 0.8, cut.coefficients[1].1, 1e-12);
    }
    #[test]
    fn the_diagonal_coefficient_is_present_even_without_self_loop() {
        let mut mdp = toy();
        mdp.set_transition(State(1), Action(0), State(0), 1.0);
        mdp.set_transition(State(1), Action(0), State(1), 0.0);
        let model = MdpModel::new(&mdp).unwrap();
        let cut = Cut::bellman(&model, State(1), Action(0));
        assert_eq!(vec![(0, -0.9), (1, 1.0)], cut.coefficients);
    }
    #[test]
    fn the_residual_is_zero_on_the_boundary() {
        let model = MdpModel::new(&toy()).unwrap();
        let cut = Cut::bellman(&model, State(1), Action(1));
        let theta = [10.0, 20.0];
        let boundary = model.q_value(State(1), Action(1), &theta) - theta[1];
        assert_close(-boundary, cut.residual(&theta), 1e-12);
    }
    #[test]
    fn pushing_the_same_pair_twice_only_stores_it_once() {
        let model = MdpModel::new(&toy()).unwrap();
        let mut pool = CutPool::new(2, 2);
        assert_eq!(Some(CutId(0)), pool.push(Cut::bellman(&model, State(0), Action(1))));
        assert_eq!(None, pool.push(Cut::bellman(&model, State(0), Action(1))));
        assert_eq!(1, pool.len());
        assert!(pool.contains(State(0), Action(1)));
        assert!(!pool.contains(State(0), Action(0)));
    }
    #[test]
    fn ids_follow_the_order_of_insertion() {
        let model = MdpModel::new(&toy()).unwrap();
        let mut pool = CutPool::new(2, 2);
        pool.push(Cut::bellman(&model, State(1), Action(1)));
        pool.push(Cut::bellman(&model, State(0), Action(0)));
        assert_eq!(Some(CutId(1)), pool.find(State(0), Action(0)));
        assert_eq!(State(1), pool.get(CutId(0)).state);
    }
    #[test]
    fn actions_of_lists_the_actions_with_a_cut() {
        let model = MdpModel::new(&toy()).unwrap();
        let mut pool = CutPool::new(2, 2);
        assert!(pool.is_empty());
        pool.push(Cut::bellman(&model, State(1), Action(1)));
        assert_eq!(0, pool.actions_of(State(0)).count());
        assert_eq!(vec![Action(1)], pool.actions_of(State(1)).collect::<Vec<_>>());
    }
}
