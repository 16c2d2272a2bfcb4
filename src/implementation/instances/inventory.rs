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

//! A single item inventory with stochastic demand (Puterman, Lee). The state
//! is the stock on hand, the action is the quantity ordered.

use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::{Action, Error, Generator, Result, State, TabularMdp};

use super::{ensure, normalize, random_distribution, DEFAULT_DISCOUNT};

/// The reward of an order that overflows the warehouse
pub const OVERFLOW_PENALTY: f64 = -100_000.0;

/// The warehouse holds at most `capacity` items. State 0 is an absorbing
/// "out of business" state which is entered when an order overflows the
/// warehouse; state $k + 1$ means that $k$ items are in stock. Action $a$
/// orders $a$ items, for $a \in [0, capacity]$.
///
/// The demand follows a Poisson law whose mean is drawn from a normal law
/// centered on half the warehouse. Selling an item yields `b`, ordering
/// costs `K + c a` (nothing when $a = 0$) and holding stock costs `h` per
/// item.
#[derive(Debug, Clone, Copy)]
pub struct InventoryInstance {
    pub capacity: usize,
    pub discount: f64,
    pub seed: u64,
}
impl InventoryInstance {
    pub fn new(capacity: usize, seed: u64) -> Self {
        InventoryInstance { capacity, discount: DEFAULT_DISCOUNT, seed }
    }
}

/// The probability of each demand `0..n` under a poisson law of the given
/// mean, renormalized over that range
fn truncated_poisson(mean: f64, n: usize) -> Vec<f64> {
    let mut pmf = Vec::with_capacity(n);
    let mut p = (-mean).exp();
    for k in 0..n {
        pmf.push(p);
        p *= mean / (k + 1) as f64;
    }
    normalize(&mut pmf);
    pmf
}

impl Generator for InventoryInstance {
    fn generate(&self) -> Result<TabularMdp> {
        ensure(self.capacity >= 1, "the warehouse must hold at least one item")?;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let n_inv = self.capacity + 1;
        let b = rng.gen_range(10.0..25.0);
        let k = rng.gen_range(3.0..8.0);
        let c = rng.gen_range(5.0..12.0);
        let h = rng.gen_range(0.1..0.3);
        let normal = Normal::new(0.5 * n_inv as f64, 0.1 * n_inv as f64)
            .map_err(|e| Error::MalformedInstance(e.to_string()))?;
        let mean = normal.sample(&mut rng).max(0.1);

        let p = truncated_poisson(mean, n_inv);
        let tail = (0..n_inv).map(|i| p[i..].iter().sum()).collect::<Vec<f64>>();

        // state 0 is the out of business state, state j + 1 holds j items
        let nb_states = n_inv + 1;
        let nb_actions = n_inv;
        let mut mdp = TabularMdp::new(nb_states, nb_actions, self.discount);
        for a in 0..nb_actions {
            mdp.set_transition(State(0), Action(a), State(0), 1.0);
        }
        for stock in 0..n_inv {
            let s = State(stock + 1);
            for a in 0..nb_actions {
                let action = Action(a);
                let level = stock + a;
                if level >= n_inv {
                    mdp.set_transition(s, action, State(0), 1.0);
                    mdp.set_reward(s, action, OVERFLOW_PENALTY);
                    continue;
                }
                // running out of stock absorbs all demands >= level
                mdp.set_transition(s, action, State(1), tail[level]);
                for left in 1..=level {
                    mdp.set_transition(s, action, State(left + 1), p[level - left]);
                }

                let order = if a == 0 { 0.0 } else { k + c * a as f64 };
                let sales: f64 = (0..level.saturating_sub(1)).map(|j| b * j as f64 * p[j]).sum();
                mdp.set_reward(s, action, sales - order - h * level as f64);
            }
        }

        let mut initial = vec![0.0];
        initial.extend(random_distribution(&mut rng, n_inv));
        mdp.set_initial_distribution(&initial);
        Ok(mdp)
    }
}
