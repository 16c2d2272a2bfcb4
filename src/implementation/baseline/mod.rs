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

//! This module provides the classical algorithms the decomposition is
//! checked against.
mod policy_iteration;
mod value_iteration;
mod exhaustive_lp;

pub use policy_iteration::*;
pub use value_iteration::*;
pub use exhaustive_lp::*;

use crate::{Action, Mdp, MdpModel, Policy, State};

/// Returns the greedy policy with respect to the given values: each state
/// plays the lowest action whose Q-value is within `tolerance` of the best.
pub(crate) fn greedy_policy(model: &MdpModel, values: &[f64], tolerance: f64) -> Policy {
    model.states().map(|s| greedy_action(model, s, values, tolerance)).collect()
}

pub(crate) fn greedy_action(model: &MdpModel, state: State, values: &[f64], tolerance: f64) -> Action {
    let max = model.actions()
        .map(|a| model.q_value(state, a, values))
        .fold(f64::NEG_INFINITY, f64::max);
    model.actions()
        .find(|a| model.q_value(state, *a, values) >= max - tolerance)
        .unwrap_or(Action(0))
}
