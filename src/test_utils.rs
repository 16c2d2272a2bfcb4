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

//! This module provides some utilities to write unit tests, the most notable
//! of which are small hand made markov decision processes.
#![cfg(test)]

use crate::{Action, State, TabularMdp};

/// The two states, two actions toy problem:
///
/// * P(.|0,0) = [0.9, 0.1], P(.|0,1) = [0.2, 0.8]
/// * P(.|1,0) = [0.5, 0.5], P(.|1,1) = [0.1, 0.9]
/// * R(0,0) = 1, R(0,1) = 0, R(1,0) = 0, R(1,1) = 2
/// * gamma = 0.9, alpha = [0.5, 0.5]
pub fn toy() -> TabularMdp {
    TabularMdp::from_dense(
        &[
            vec![vec![0.9, 0.1], vec![0.5, 0.5]],
            vec![vec![0.2, 0.8], vec![0.1, 0.9]],
        ],
        &[vec![1.0, 0.0], vec![0.0, 2.0]],
        &[0.5, 0.5],
        0.9)
}

/// The optimal value function of the toy problem, computed by value
/// iteration until the successive iterates differ by less than 1e-13.
pub fn toy_values() -> Vec<f64> {
    let mut v = vec![0.0, 0.0];
    loop {
        let v0 = f64::max(1.0 + 0.9 * (0.9 * v[0] + 0.1 * v[1]), 0.9 * (0.2 * v[0] + 0.8 * v[1]));
        let v1 = f64::max(0.9 * (0.5 * v[0] + 0.5 * v[1]), 2.0 + 0.9 * (0.1 * v[0] + 0.9 * v[1]));
        let delta = f64::max((v0 - v[0]).abs(), (v1 - v[1]).abs());
        v = vec![v0, v1];
        if delta < 1e-13 {
            return v;
        }
    }
}

/// A single state mdp where every action loops with the same reward: all
/// actions are tied.
pub fn ties(nb_actions: usize) -> TabularMdp {
    let mut mdp = TabularMdp::new(1, nb_actions, 0.5);
    for a in 0..nb_actions {
        mdp.set_transition(State(0), Action(a), State(0), 1.0);
        mdp.set_reward(State(0), Action(a), 1.0);
    }
    mdp.set_initial(State(0), 1.0);
    mdp
}

/// A chain where state `s` is rewarded `s` for action 0 and `n - s` for
/// action 1 (every action stays in place). The optimal policy plays action 1
/// on the lower half of the chain and action 0 on the upper half: it is
/// decreasing, hence not monotone.
pub fn decreasing_chain(nb_states: usize) -> TabularMdp {
    let mut mdp = TabularMdp::new(nb_states, 2, 0.5);
    for s in 0..nb_states {
        mdp.set_transition(State(s), Action(0), State(s), 1.0);
        mdp.set_transition(State(s), Action(1), State(s), 1.0);
        mdp.set_reward(State(s), Action(0), s as f64);
        mdp.set_reward(State(s), Action(1), (nb_states - s) as f64);
        mdp.set_initial(State(s), 1.0 / nb_states as f64);
    }
    mdp
}

/// Asserts that two floats are within `tolerance` of one another
pub fn assert_close(expected: f64, actual: f64, tolerance: f64) {
    assert!((expected - actual).abs() <= tolerance,
        "expected {expected} got {actual} (tolerance {tolerance})");
}
