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

//! This module provides the seeded generators of the benchmark families.
//! Each of them produces a `TabularMdp` which must then go through
//! `MdpModel::new` like any other mdp.
mod random;
mod queue;
mod bandit;
mod inventory;
mod replacement;
mod transmission;

pub use random::*;
pub use queue::*;
pub use bandit::*;
pub use inventory::*;
pub use replacement::*;
pub use transmission::*;

use rand::Rng;

use crate::{Error, Result};

/// The discount factor of all benchmark families
pub const DEFAULT_DISCOUNT: f64 = 0.999;

/// Draws a probability distribution over `n` outcomes by normalizing `n`
/// uniform draws.
pub(crate) fn random_distribution<R: Rng>(rng: &mut R, n: usize) -> Vec<f64> {
    let mut weights = (0..n).map(|_| rng.gen_range(f64::EPSILON..1.0)).collect::<Vec<_>>();
    normalize(&mut weights);
    weights
}

/// Scales the given weights so that they sum to one
pub(crate) fn normalize(weights: &mut [f64]) {
    let total: f64 = weights.iter().sum();
    weights.iter_mut().for_each(|w| *w /= total);
}

/// Fails with a `MalformedInstance` error unless `condition` holds
pub(crate) fn ensure(condition: bool, what: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::MalformedInstance(what.to_string()))
    }
}
