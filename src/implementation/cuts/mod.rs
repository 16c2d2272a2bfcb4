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

//! This module provides the implementations of the cut generators: the
//! unrestricted `FullScan` and the `MonotoneScan` which exploits the known
//! monotone structure of some optimal policies.
mod full;
mod monotone;

pub use full::*;
pub use monotone::*;

use crate::{Action, Candidate, MdpModel, State};

/// The default tolerance $\epsilon$ under which a violation is ignored
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Evaluates the actions `lo..=hi` of `state` and returns the candidate to
/// propose along with the largest right hand side that was met.
///
/// The candidate is the action of lowest index among those whose right hand
/// side is within `tolerance` of the largest one. `values` is a scratch
/// buffer which avoids an allocation per state.
pub(crate) fn best_in_window(
    model: &MdpModel,
    state: State,
    theta: &[f64],
    lo: usize,
    hi: usize,
    tolerance: f64,
    values: &mut Vec<f64>,
) -> (Candidate, f64) {
    values.clear();
    let mut max = f64::NEG_INFINITY;
    for a in lo..=hi {
        let q = model.q_value(state, Action(a), theta);
        max = max.max(q);
        values.push(q);
    }
    let pos = values.iter().position(|q| *q >= max - tolerance).unwrap_or(0);
    (Candidate { action: Action(lo + pos), value: values[pos] }, max)
}

/// Returns true iff the Bellman inequality of `state` is violated beyond the
/// tolerance by `theta`.
#[inline]
pub(crate) fn is_violated(theta: &[f64], state: State, max: f64, tolerance: f64) -> bool {
    theta[state.id()] < max - tolerance
}
