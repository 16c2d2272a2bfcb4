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

//! This module defines the `Baseline` trait: the interface of the classical
//! solvers used to cross check the decomposition.

use std::time::Duration;

use crate::{MdpModel, Policy, Result};

/// The outcome of a baseline resolution
#[derive(Debug, Clone)]
pub struct BaselineOutcome {
    /// The expected discounted reward under the initial distribution
    pub objective: f64,
    /// The optimal value of each state
    pub values: Vec<f64>,
    /// An optimal policy
    pub policy: Policy,
    /// The time it took to solve the model
    pub run_time: Duration,
}

/// A baseline solves the very same model as the decomposition, with a
/// classical algorithm. It is meant for validation only and is never invoked
/// by the decomposition itself.
pub trait Baseline {
    /// Solves the model to optimality
    fn solve(&self, model: &MdpModel) -> Result<BaselineOutcome>;
}
