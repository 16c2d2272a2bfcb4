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

//! This module provides `TabularMdp`: a plain, mutable, sparse table based
//! implementation of the `Mdp` trait. This is what the instance generators
//! produce and what you will want to use when your transition matrices are
//! known explicitly.

use crate::{Action, Mdp, State, SuccessorCallback};

/// A markov decision process given by its tables. Transitions are stored as
/// one sparse row per (state, action) pair, sorted by successor.
#[derive(Debug, Clone)]
pub struct TabularMdp {
    nb_states: usize,
    nb_actions: usize,
    rows: Vec<Vec<(usize, f64)>>,
    rewards: Vec<f64>,
    initial: Vec<f64>,
    discount: f64,
}

impl TabularMdp {
    /// Creates an mdp where all transition probabilities, rewards and initial
    /// probabilities are zero.
    pub fn new(nb_states: usize, nb_actions: usize, discount: f64) -> Self {
        TabularMdp {
            nb_states,
            nb_actions,
            rows: vec![vec![]; nb_states * nb_actions],
            rewards: vec![0.0; nb_states * nb_actions],
            initial: vec![0.0; nb_states],
            discount,
        }
    }
    /// Creates an mdp from dense tables: `transitions[a][s][s']` is
    /// $P(s'|s,a)$ and `rewards[s][a]` is $R(s,a)$.
    pub fn from_dense(transitions: &[Vec<Vec<f64>>], rewards: &[Vec<f64>], initial: &[f64], discount: f64) -> Self {
        let nb_states = initial.len();
        let nb_actions = transitions.len();
        let mut mdp = Self::new(nb_states, nb_actions, discount);
        for (a, matrix) in transitions.iter().enumerate() {
            for (s, row) in matrix.iter().enumerate() {
                for (n, p) in row.iter().enumerate() {
                    mdp.set_transition(State(s), Action(a), State(n), *p);
                }
            }
        }
        for (s, row) in rewards.iter().enumerate() {
            for (a, r) in row.iter().enumerate() {
                mdp.set_reward(State(s), Action(a), *r);
            }
        }
        for (s, p) in initial.iter().enumerate() {
            mdp.set_initial(State(s), *p);
        }
        mdp
    }

    /// Sets $P(next | state, action)$. Setting a probability to zero removes
    /// the corresponding entry.
    pub fn set_transition(&mut self, state: State, action: Action, next: State, probability: f64) {
        let row = &mut self.rows[state.id() * self.nb_actions + action.id()];
        match row.binary_search_by_key(&next.id(), |(n, _)| *n) {
            Ok(i) if probability == 0.0 => { row.remove(i); },
            Ok(i) => row[i].1 = probability,
            Err(_) if probability == 0.0 => {},
            Err(i) => row.insert(i, (next.id(), probability)),
        }
    }
    /// Adds `probability` to $P(next | state, action)$
    pub fn add_transition(&mut self, state: State, action: Action, next: State, probability: f64) {
        let current = self.transition(next, state, action);
        self.set_transition(state, action, next, current + probability);
    }
    /// Sets $R(state, action)$
    pub fn set_reward(&mut self, state: State, action: Action, reward: f64) {
        self.rewards[state.id() * self.nb_actions + action.id()] = reward;
    }
    /// Sets $\alpha_{state}$
    pub fn set_initial(&mut self, state: State, probability: f64) {
        self.initial[state.id()] = probability;
    }
    /// Sets the whole initial distribution at once
    pub fn set_initial_distribution(&mut self, distribution: &[f64]) {
        self.initial.copy_from_slice(distribution);
    }
    /// Sets $\gamma$
    pub fn set_discount(&mut self, discount: f64) {
        self.discount = discount;
    }
}

impl Mdp for TabularMdp {
    fn nb_states(&self) -> usize {
        self.nb_states
    }
    fn nb_actions(&self) -> usize {
        self.nb_actions
    }
    fn transition(&self, next: State, current: State, action: Action) -> f64 {
        let row = &self.rows[current.id() * self.nb_actions + action.id()];
        row.binary_search_by_key(&next.id(), |(n, _)| *n)
            .map(|i| row[i].1)
            .unwrap_or(0.0)
    }
    fn reward(&self, state: State, action: Action) -> f64 {
        self.rewards[state.id() * self.nb_actions + action.id()]
    }
    fn initial_probability(&self, state: State) -> f64 {
        self.initial[state.id()]
    }
    fn discount_factor(&self) -> f64 {
        self.discount
    }
    fn for_each_successor(&self, state: State, action: Action, f: &mut dyn SuccessorCallback) {
        for (next, p) in self.rows[state.id() * self.nb_actions + action.id()].iter() {
            f.apply(State(*next), *p);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Action, Mdp, State, TabularMdp};

    #[test]
    fn a_fresh_mdp_is_all_zeroes() {
        let mdp = TabularMdp::new(3, 2, 0.5);
        assert_eq!(0.0, mdp.transition(State(1), State(0), Action(1)));
        assert_eq!(0.0, mdp.reward(State(2), Action(0)));
        assert_eq!(0.0, mdp.initial_probability(State(2)));
        assert_eq!(0.5, mdp.discount_factor());
    }
    #[test]
    fn set_transition_overwrites_the_previous_probability() {
        let mut mdp = TabularMdp::new(3, 1, 0.5);
        mdp.set_transition(State(0), Action(0), State(2), 0.3);
        mdp.set_transition(State(0), Action(0), State(2), 0.6);
        assert_eq!(0.6, mdp.transition(State(2), State(0), Action(0)));
    }
    #[test]
    fn add_transition_accumulates() {
        let mut mdp = TabularMdp::new(3, 1, 0.5);
        mdp.add_transition(State(0), Action(0), State(2), 0.25);
        mdp.add_transition(State(0), Action(0), State(2), 0.25);
        assert_eq!(0.5, mdp.transition(State(2), State(0), Action(0)));
    }
    #[test]
    fn successors_are_enumerated_in_increasing_order() {
        let mut mdp = TabularMdp::new(4, 1, 0.5);
        mdp.set_transition(State(0), Action(0), State(3), 0.5);
        mdp.set_transition(State(0), Action(0), State(1), 0.5);
        mdp.set_transition(State(0), Action(0), State(2), 0.0);
        let mut seen = vec![];
        mdp.for_each_successor(State(0), Action(0), &mut |n: State, _: f64| seen.push(n));
        assert_eq!(vec![State(1), State(3)], seen);
    }
    #[test]
    fn from_dense_reads_transitions_action_first() {
        let mdp = TabularMdp::from_dense(
            &[vec![vec![1.0, 0.0], vec![0.0, 1.0]], vec![vec![0.0, 1.0], vec![1.0, 0.0]]],
            &[vec![1.0, 2.0], vec![3.0, 4.0]],
            &[1.0, 0.0],
            0.9);
        assert_eq!(2, mdp.nb_actions());
        assert_eq!(1.0, mdp.transition(State(1), State(0), Action(1)));
        assert_eq!(3.0, mdp.reward(State(1), Action(0)));
        assert_eq!(1.0, mdp.initial_probability(State(0)));
    }
}
