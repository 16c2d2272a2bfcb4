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

//! This module defines the contract of the markov decision processes the
//! engine is able to decompose.

use crate::{State, Action};

/// This trait defines the "contract" of a discounted markov decision process.
/// States and actions are dense indices: the states are `0..nb_states()` and
/// the very same actions `0..nb_actions()` are available in every state.
///
/// An implementation is only ever *read*. It is validated and copied once
/// into an `MdpModel` before the decomposition starts, so the functions
/// below need not be fast.
pub trait Mdp {
    /// The number of states $|S|$ of the process
    fn nb_states(&self) -> usize;
    /// The number of actions $|A|$ of the process
    fn nb_actions(&self) -> usize;
    /// The probability $P(next | current, action)$ to move to `next` when
    /// playing `action` in state `current`.
    fn transition(&self, next: State, current: State, action: Action) -> f64;
    /// The immediate reward $R(state, action)$. It may be a (large) negative
    /// penalty when an action is not supposed to be played in some state.
    fn reward(&self, state: State, action: Action) -> f64;
    /// The probability $\alpha_s$ that the process starts in `state`
    fn initial_probability(&self, state: State) -> f64;
    /// The discount factor $\gamma \in (0, 1)$
    fn discount_factor(&self) -> f64;

    /// This method calls the function `f` for every state `next` that can be
    /// reached with a positive probability when playing `action` in `state`.
    /// The default implementation asks `transition()` for every possible
    /// next state; sparse models should override it.
    fn for_each_successor(&self, state: State, action: Action, f: &mut dyn SuccessorCallback) {
        for next in self.states() {
            let p = self.transition(next, state, action);
            if p != 0.0 {
                f.apply(next, p);
            }
        }
    }

    /// Iterates over all the states of the process in increasing order
    fn states(&self) -> StateRange {
        StateRange { next: 0, end: self.nb_states() }
    }
    /// Iterates over all the actions of the process in increasing order
    fn actions(&self) -> ActionRange {
        ActionRange { next: 0, end: self.nb_actions() }
    }
}

/// This trait basically defines a callback which is passed on to the mdp so
/// as to let it efficiently enumerate the successors of a state.
pub trait SuccessorCallback {
    /// executes the callback for the given successor and probability
    fn apply(&mut self, next: State, probability: f64);
}
/// The simplest and most natural callback implementation is to simply use
/// a closure.
impl <X: FnMut(State, f64)> SuccessorCallback for X {
    fn apply(&mut self, next: State, probability: f64) {
        self(next, probability)
    }
}

/// An iterator over the states `0..n`
#[derive(Debug, Clone)]
pub struct StateRange {
    next: usize,
    end : usize,
}
impl Iterator for StateRange {
    type Item = State;
    fn next(&mut self) -> Option<State> {
        if self.next < self.end {
            self.next += 1;
            Some(State(self.next - 1))
        } else {
            None
        }
    }
}

/// An iterator over the actions `0..n`
#[derive(Debug, Clone)]
pub struct ActionRange {
    next: usize,
    end : usize,
}
impl Iterator for ActionRange {
    type Item = Action;
    fn next(&mut self) -> Option<Action> {
        if self.next < self.end {
            self.next += 1;
            Some(Action(self.next - 1))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Action, Mdp, State};

    struct Dummy;
    struct Chain;
    impl Mdp for Chain {
        fn nb_states(&self) -> usize { 3 }
        fn nb_actions(&self) -> usize { 1 }
        fn transition(&self, next: State, current: State, _: Action) -> f64 {
            if next.id() == (current.id() + 1) % 3 { 1.0 } else { 0.0 }
        }
        fn reward(&self, _: State, _: Action) -> f64 { todo!() }
        fn initial_probability(&self, _: State) -> f64 { todo!() }
        fn discount_factor(&self) -> f64 { todo!() }
    }
    impl Mdp for Dummy {
        fn nb_states(&self) -> usize { 3 }
        fn nb_actions(&self) -> usize { 2 }
        fn transition(&self, _: State, _: State, _: Action) -> f64 { todo!() }
        fn reward(&self, _: State, _: Action) -> f64 { todo!() }
        fn initial_probability(&self, _: State) -> f64 { todo!() }
        fn discount_factor(&self) -> f64 { todo!() }
    }

    #[test]
    fn by_default_states_are_enumerated_in_order() {
        let states = Dummy.states().collect::<Vec<_>>();
        assert_eq!(vec![State(0), State(1), State(2)], states);
    }
    #[test]
    fn by_default_successors_skip_the_zero_probabilities() {
        let mut seen = vec![];
        Chain.for_each_successor(State(2), Action(0), &mut |s: State, p: f64| seen.push((s, p)));
        assert_eq!(vec![(State(0), 1.0)], seen);
    }
    #[test]
    fn by_default_actions_are_enumerated_in_order() {
        let actions = Dummy.actions().collect::<Vec<_>>();
        assert_eq!(vec![Action(0), Action(1)], actions);
    }
}
