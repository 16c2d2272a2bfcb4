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

//! This module provides the `MdpModel`: the validated, immutable and cache
//! friendly representation of a markov decision process which is used by
//! every other component of the engine.

use crate::{Action, Error, Mdp, Result, State, SuccessorCallback};

/// How far from 1 the probabilities of a transition row may sum up to
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// This structure is an immutable copy of some `Mdp` which has been checked
/// to be well formed. The transition function is stored as a sparse (CSR)
/// matrix with one row per (state, action) pair; row `s * |A| + a` lists the
/// successors of `s` when playing `a`.
#[derive(Debug, Clone)]
pub struct MdpModel {
    nb_states: usize,
    nb_actions: usize,
    /// `offsets[r]..offsets[r+1]` delimits the successors of row `r`
    offsets: Vec<usize>,
    targets: Vec<usize>,
    probabilities: Vec<f64>,
    /// `rewards[s * |A| + a]` is $R(s, a)$
    rewards: Vec<f64>,
    initial: Vec<f64>,
    discount: f64,
}

impl MdpModel {
    /// Copies the given mdp and checks that it is well formed. This is the
    /// only place where the `MalformedInstance` error may be raised.
    pub fn new(mdp: &dyn Mdp) -> Result<Self> {
        let nb_states = mdp.nb_states();
        let nb_actions = mdp.nb_actions();
        if nb_states == 0 {
            return Err(Error::MalformedInstance("the mdp has no state".to_string()));
        }
        if nb_actions == 0 {
            return Err(Error::MalformedInstance("the mdp has no action".to_string()));
        }
        let discount = mdp.discount_factor();
        if !(discount > 0.0 && discount < 1.0) {
            return Err(Error::MalformedInstance(format!("discount factor {discount} is not in (0, 1)")));
        }

        let mut offsets = Vec::with_capacity(nb_states * nb_actions + 1);
        let mut targets = vec![];
        let mut probabilities = vec![];
        let mut rewards = Vec::with_capacity(nb_states * nb_actions);
        offsets.push(0);

        for state in mdp.states() {
            for action in mdp.actions() {
                let mut row = vec![];
                let mut invalid = None;
                mdp.for_each_successor(state, action, &mut |next: State, p: f64| {
                    if !p.is_finite() || p < 0.0 || next.id() >= nb_states {
                        invalid.get_or_insert((next, p));
                    } else if p > 0.0 {
                        row.push((next.id(), p));
                    }
                });
                if let Some((next, p)) = invalid {
                    return Err(Error::MalformedInstance(format!(
                        "P({} | {}, {}) = {p} is not a valid probability", next.id(), state.id(), action.id())));
                }
                row.sort_unstable_by_key(|(next, _)| *next);
                // successors reported more than once are merged
                row.dedup_by(|(next, p), (kept, q)| {
                    if next == kept {
                        *q += *p;
                        true
                    } else {
                        false
                    }
                });
                let total = row.iter().map(|(_, p)| *p).sum::<f64>();
                if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
                    return Err(Error::MalformedInstance(format!(
                        "transition row of state {} action {} sums to {total}", state.id(), action.id())));
                }
                for (next, p) in row {
                    targets.push(next);
                    probabilities.push(p);
                }
                offsets.push(targets.len());

                let r = mdp.reward(state, action);
                if !r.is_finite() {
                    return Err(Error::MalformedInstance(format!(
                        "reward of state {} action {} is not finite", state.id(), action.id())));
                }
                rewards.push(r);
            }
        }

        let initial = mdp.states().map(|s| mdp.initial_probability(s)).collect::<Vec<_>>();
        if initial.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(Error::MalformedInstance("the initial distribution has a negative entry".to_string()));
        }
        let total = initial.iter().sum::<f64>();
        if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(Error::MalformedInstance(format!("the initial distribution sums to {total}")));
        }

        Ok(MdpModel { nb_states, nb_actions, offsets, targets, probabilities, rewards, initial, discount })
    }

    #[inline]
    pub fn nb_states(&self) -> usize {
        self.nb_states
    }
    #[inline]
    pub fn nb_actions(&self) -> usize {
        self.nb_actions
    }
    /// The discount factor $\gamma$
    #[inline]
    pub fn discount(&self) -> f64 {
        self.discount
    }
    /// The initial distribution $\alpha$
    #[inline]
    pub fn initial_distribution(&self) -> &[f64] {
        &self.initial
    }
    #[inline]
    pub fn reward_of(&self, state: State, action: Action) -> f64 {
        self.rewards[self.row(state, action)]
    }
    /// Returns the successors of `state` under `action` along with their
    /// (strictly positive) probabilities.
    #[inline]
    pub fn successors(&self, state: State, action: Action) -> (&[usize], &[f64]) {
        let row = self.row(state, action);
        let range = self.offsets[row]..self.offsets[row + 1];
        (&self.targets[range.clone()], &self.probabilities[range])
    }
    /// Computes $Q(s, a) = R(s,a) + \gamma \sum_{s'} P(s'|s,a) \theta_{s'}$:
    /// the right hand side of the Bellman inequality of (s, a) at `theta`.
    #[inline]
    pub fn q_value(&self, state: State, action: Action, theta: &[f64]) -> f64 {
        let (targets, probabilities) = self.successors(state, action);
        let expected = targets.iter().zip(probabilities.iter())
            .map(|(next, p)| p * theta[*next])
            .sum::<f64>();
        self.reward_of(state, action) + self.discount * expected
    }
    /// Computes $\sum_s \alpha_s \theta_s$
    pub fn expected_value(&self, theta: &[f64]) -> f64 {
        self.initial.iter().zip(theta.iter()).map(|(a, t)| a * t).sum()
    }
    /// The smallest immediate reward of the model
    pub fn min_reward(&self) -> f64 {
        self.rewards.iter().copied().fold(f64::INFINITY, f64::min)
    }
    /// A lower bound on the value of every state under any policy:
    /// $\min_{s,a} R(s,a) / (1 - \gamma)$
    pub fn value_lower_bound(&self) -> f64 {
        self.min_reward() / (1.0 - self.discount)
    }

    #[inline]
    fn row(&self, state: State, action: Action) -> usize {
        state.id() * self.nb_actions + action.id()
    }
}

impl Mdp for MdpModel {
    fn nb_states(&self) -> usize {
        self.nb_states
    }
    fn nb_actions(&self) -> usize {
        self.nb_actions
    }
    fn transition(&self, next: State, current: State, action: Action) -> f64 {
        let (targets, probabilities) = self.successors(current, action);
        targets.binary_search(&next.id())
            .map(|i| probabilities[i])
            .unwrap_or(0.0)
    }
    fn reward(&self, state: State, action: Action) -> f64 {
        self.reward_of(state, action)
    }
    fn initial_probability(&self, state: State) -> f64 {
        self.initial[state.id()]
    }
    fn discount_factor(&self) -> f64 {
        self.discount
    }
    fn for_each_successor(&self, state: State, action: Action, f: &mut dyn SuccessorCallback) {
        let (targets, probabilities) = self.successors(state, action);
        for (next, p) in targets.iter().zip(probabilities.iter()) {
            f.apply(State(*next), *p);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Action, Cut, Error, Mdp, MdpModel, State, SuccessorCallback, TabularMdp};
    use crate::test_utils::toy;

    #[test]
    fn the_model_keeps_the_dimensions_of_the_mdp() {
        let model = MdpModel::new(&toy()).unwrap();
        assert_eq!(2, model.nb_states());
        assert_eq!(2, model.nb_actions());
        assert_eq!(0.9, model.discount());
        assert_eq!(&[0.5, 0.5], model.initial_distribution());
    }
    #[test]
    fn the_model_answers_like_the_mdp_it_was_built_from() {
        let mdp = toy();
        let model = MdpModel::new(&mdp).unwrap();
        for s in mdp.states() {
            for a in mdp.actions() {
                assert_eq!(mdp.reward(s, a), model.reward(s, a));
                for n in mdp.states() {
                    assert_eq!(mdp.transition(n, s, a), model.transition(n, s, a));
                }
            }
        }
    }
    #[test]
    fn q_value_adds_the_discounted_expectation_to_the_reward() {
        let model = MdpModel::new(&toy()).unwrap();
        // R(0,1) + 0.9 * (0.2 * 10 + 0.8 * 20)
        let q = model.q_value(State(0), Action(1), &[10.0, 20.0]);
        assert!((q - 16.2).abs() < 1e-12);
    }
    #[test]
    fn expected_value_weights_theta_with_the_initial_distribution() {
        let model = MdpModel::new(&toy()).unwrap();
        assert!((model.expected_value(&[2.0, 4.0]) - 3.0).abs() < 1e-12);
    }
    #[test]
    fn value_lower_bound_is_min_reward_over_one_minus_gamma() {
        let model = MdpModel::new(&toy()).unwrap();
        assert_eq!(0.0, model.min_reward());
        assert_eq!(0.0, model.value_lower_bound());
    }
    #[test]
    fn zero_probabilities_are_not_stored() {
        let mut mdp = TabularMdp::new(2, 1, 0.5);
        mdp.set_transition(State(0), Action(0), State(0), 1.0);
        mdp.set_transition(State(1), Action(0), State(1), 1.0);
        mdp.set_initial(State(0), 1.0);
        let model = MdpModel::new(&mdp).unwrap();
        let (targets, probabilities) = model.successors(State(0), Action(0));
        assert_eq!(&[0], targets);
        assert_eq!(&[1.0], probabilities);
    }

    /// A two state chain whose successors are reported in pieces
    struct Fragmented;
    impl Mdp for Fragmented {
        fn nb_states(&self) -> usize { 2 }
        fn nb_actions(&self) -> usize { 1 }
        fn transition(&self, _: State, _: State, _: Action) -> f64 { 0.5 }
        fn reward(&self, state: State, _: Action) -> f64 { state.id() as f64 }
        fn initial_probability(&self, _: State) -> f64 { 0.5 }
        fn discount_factor(&self) -> f64 { 0.9 }
        fn for_each_successor(&self, _: State, _: Action, f: &mut dyn SuccessorCallback) {
            f.apply(State(1), 0.25);
            f.apply(State(0), 0.5);
            f.apply(State(1), 0.25);
        }
    }

    #[test]
    fn successors_reported_twice_are_merged() {
        let model = MdpModel::new(&Fragmented).unwrap();
        let (targets, probabilities) = model.successors(State(1), Action(0));
        assert_eq!(&[0, 1], targets);
        assert_eq!(&[0.5, 0.5], probabilities);

        let cut = Cut::bellman(&model, State(1), Action(0));
        assert_eq!(vec![(0, -0.45), (1, 1.0 - 0.45)], cut.coefficients);
    }

    fn is_malformed(mdp: &TabularMdp) -> bool {
        matches!(MdpModel::new(mdp), Err(Error::MalformedInstance(_)))
    }

    #[test]
    fn rows_that_do_not_sum_to_one_are_rejected() {
        let mut mdp = toy();
        mdp.set_transition(State(1), Action(1), State(1), 0.8);
        assert!(is_malformed(&mdp));
    }
    #[test]
    fn negative_probabilities_are_rejected() {
        let mut mdp = toy();
        mdp.set_transition(State(0), Action(0), State(0), 1.1);
        mdp.set_transition(State(0), Action(0), State(1), -0.1);
        assert!(is_malformed(&mdp));
    }
    #[test]
    fn a_bad_initial_distribution_is_rejected() {
        let mut mdp = toy();
        mdp.set_initial(State(0), 0.7);
        assert!(is_malformed(&mdp));
    }
    #[test]
    fn a_discount_factor_outside_the_unit_interval_is_rejected() {
        let mut mdp = toy();
        mdp.set_discount(1.0);
        assert!(is_malformed(&mdp));
        mdp.set_discount(0.0);
        assert!(is_malformed(&mdp));
    }
    #[test]
    fn non_finite_rewards_are_rejected() {
        let mut mdp = toy();
        mdp.set_reward(State(1), Action(0), f64::NAN);
        assert!(is_malformed(&mdp));
    }
    #[test]
    fn empty_mdps_are_rejected() {
        assert!(is_malformed(&TabularMdp::new(0, 2, 0.9)));
        assert!(is_malformed(&TabularMdp::new(2, 0, 0.9)));
    }
}
