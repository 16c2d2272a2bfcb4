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

//! This module provides the unrestricted cut generator. It looks at every
//! action of every state, and spreads the states over as many threads as
//! requested. By default, it uses as many threads as the number of hardware
//! threads available on the machine.

use parking_lot::Mutex;

use crate::{Action, Candidate, CutGenerator, MdpModel, Separation, State};

use super::{best_in_window, is_violated};

/// The number of consecutive states a worker processes at once
const CHUNK_SIZE: usize = 64;

/// The shared data that may only be manipulated within critical sections
struct Critical {
    /// The first state that has not been handed to any worker yet
    next: usize,
    /// The best candidate of each state
    best: Vec<Candidate>,
    /// The largest right hand side of each state
    maxima: Vec<f64>,
}

/// This is the unrestricted cut generator: for every state $s$ it computes
/// $\max_a R(s,a) + \gamma \sum_{s'} P(s'|s,a) \theta_{s'}$ and proposes the
/// cut of the (lowest index) maximizing action when $\theta_s$ falls short of
/// that maximum by more than the tolerance.
///
/// The outcome does not depend on the number of threads.
#[derive(Debug, Clone)]
pub struct FullScan {
    tolerance: f64,
    nb_threads: usize,
}

impl FullScan {
    pub fn new(tolerance: f64) -> Self {
        FullScan { tolerance, nb_threads: num_cpus::get() }
    }
    /// Sets the number of threads used to evaluate the states
    pub fn with_nb_threads(mut self, nb_threads: usize) -> Self {
        self.nb_threads = nb_threads.max(1);
        self
    }
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
    pub fn nb_threads(&self) -> usize {
        self.nb_threads
    }

    fn scan_sequential(&self, model: &MdpModel, theta: &[f64]) -> (Vec<Candidate>, Vec<f64>) {
        let hi = model.nb_actions() - 1;
        let mut values = Vec::with_capacity(model.nb_actions());
        (0..model.nb_states())
            .map(|s| best_in_window(model, State(s), theta, 0, hi, self.tolerance, &mut values))
            .unzip()
    }

    fn scan_parallel(&self, model: &MdpModel, theta: &[f64]) -> (Vec<Candidate>, Vec<f64>) {
        let nb_states = model.nb_states();
        let hi = model.nb_actions() - 1;
        let critical = Mutex::new(Critical {
            next: 0,
            best: vec![Candidate { action: Action(0), value: f64::NEG_INFINITY }; nb_states],
            maxima: vec![f64::NEG_INFINITY; nb_states],
        });

        std::thread::scope(|s| {
            for _ in 0..self.nb_threads {
                let critical = &critical;
                s.spawn(move || {
                    let mut values = Vec::with_capacity(hi + 1);
                    let mut local = Vec::with_capacity(CHUNK_SIZE);
                    loop {
                        let start = {
                            let mut critical = critical.lock();
                            let start = critical.next;
                            critical.next = (start + CHUNK_SIZE).min(nb_states);
                            start
                        };
                        if start >= nb_states {
                            break;
                        }
                        let end = (start + CHUNK_SIZE).min(nb_states);

                        local.clear();
                        for state in start..end {
                            local.push(best_in_window(model, State(state), theta, 0, hi, self.tolerance, &mut values));
                        }

                        let mut critical = critical.lock();
                        for (i, (cand, max)) in local.drain(..).enumerate() {
                            critical.best[start + i] = cand;
                            critical.maxima[start + i] = max;
                        }
                    }
                });
            }
        });

        let Critical { best, maxima, .. } = critical.into_inner();
        (best, maxima)
    }
}

impl CutGenerator for FullScan {
    fn separate(&self, model: &MdpModel, theta: &[f64]) -> Separation {
        let (best, maxima) = if self.nb_threads > 1 && model.nb_states() > CHUNK_SIZE {
            self.scan_parallel(model, theta)
        } else {
            self.scan_sequential(model, theta)
        };

        let violated = maxima.iter().enumerate()
            .filter(|(s, max)| is_violated(theta, State(*s), **max, self.tolerance))
            .map(|(s, _)| State(s))
            .collect();

        Separation {
            best,
            violated,
            evaluations: model.nb_states() * model.nb_actions(),
            certification_evaluations: 0,
            exhaustive: true,
        }
    }
}
