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

//! Fully random mdps: dense uniform transitions and integer rewards.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{Generator, Result, TabularMdp};

use super::{ensure, random_distribution, DEFAULT_DISCOUNT};

/// Every row of the transition matrices is a random distribution over all
/// the states, the rewards are integers drawn uniformly in `[0, 100)` and
/// the initial distribution is random too.
#[derive(Debug, Clone, Copy)]
pub struct RandomInstance {
    pub nb_states: usize,
    pub nb_actions: usize,
    pub discount: f64,
    pub seed: u64,
}
impl RandomInstance {
    pub fn new(nb_states: usize, nb_actions: usize, seed: u64) -> Self {
        RandomInstance { nb_states, nb_actions, discount: DEFAULT_DISCOUNT, seed }
    }
}

impl Generator for RandomInstance {
    fn generate(&self) -> Result<TabularMdp> {
        ensure(self.nb_states > 0 && self.nb_actions > 0, "a random instance needs states and actions")?;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let transitions = (0..self.nb_actions)
            .map(|_| (0..self.nb_states).map(|_| random_distribution(&mut rng, self.nb_states)).collect())
            .collect::<Vec<Vec<Vec<f64>>>>();
        let rewards = (0..self.nb_states)
            .map(|_| (0..self.nb_actions).map(|_| rng.gen_range(0..100) as f64).collect())
            .collect::<Vec<Vec<f64>>>();
        let initial = random_distribution(&mut rng, self.nb_states);

        Ok(TabularMdp::from_dense(&transitions, &rewards, &initial, self.discount))
    }
}
