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

//! This module provides the full linear program of the mdp, with one
//! constraint per (state, action) pair, solved in one shot.

use std::time::Instant;

use tracing::debug;

use crate::{Baseline, BaselineOutcome, Cut, DEFAULT_FEASIBILITY_TOLERANCE, MasterRelaxation, Mdp, MdpModel, Result};

use super::greedy_policy;

/// Solves the master relaxation where every cut is present from the start.
/// This is the lp the decomposition avoids to build.
#[derive(Debug, Clone, Copy)]
pub struct ExhaustiveLp {
    pub tolerance: f64,
    pub feasibility_tolerance: f64,
}
impl Default for ExhaustiveLp {
    fn default() -> Self {
        ExhaustiveLp { tolerance: 1e-9, feasibility_tolerance: DEFAULT_FEASIBILITY_TOLERANCE }
    }
}

impl Baseline for ExhaustiveLp {
    fn solve(&self, model: &MdpModel) -> Result<BaselineOutcome> {
        let start = Instant::now();
        let mut master = MasterRelaxation::new(model, model.value_lower_bound(), self.feasibility_tolerance);
        for s in model.states() {
            for a in model.actions() {
                master.add_cut(Cut::bellman(model, s, a));
            }
        }
        let solution = master.solve()?;
        debug!(cuts = master.pool().len(), "full lp solved");
        Ok(BaselineOutcome {
            objective: solution.objective,
            policy: greedy_policy(model, &solution.theta, self.tolerance),
            values: solution.theta,
            run_time: start.elapsed(),
        })
    }
}
