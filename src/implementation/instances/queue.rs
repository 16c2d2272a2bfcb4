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

//! A single server queue with controllable service rate (de Farias and
//! Van Roy). The state is the number of jobs in the queue and the action
//! picks the service rate, which is paid for with a cubic cost.

use rand::{rngs::StdRng, SeedableRng};

use crate::{Generator, Result, TabularMdp};

use super::{ensure, random_distribution, DEFAULT_DISCOUNT};

/// During each period a job arrives with probability `arrival` and the job
/// in service completes with probability $q_a$, where the service rates
/// $q_a$ are evenly spaced between 0 and `1 - arrival`. Holding $s$ jobs and
/// serving at rate $q_a$ yields a reward of $-s - 60 q_a^3$.
#[derive(Debug, Clone, Copy)]
pub struct QueueInstance {
    pub nb_states: usize,
    pub nb_actions: usize,
    pub arrival: f64,
    pub discount: f64,
    pub seed: u64,
}
impl QueueInstance {
    pub fn new(nb_states: usize, nb_actions: usize, arrival: f64, seed: u64) -> Self {
        QueueInstance { nb_states, nb_actions, arrival, discount: DEFAULT_DISCOUNT, seed }
    }

    /// The service rate of each action
    pub fn service_rates(&self) -> Vec<f64> {
        let top = 1.0 - self.arrival;
        if self.nb_actions == 1 {
            return vec![0.0];
        }
        (0..self.nb_actions)
            .map(|a| top * a as f64 / (self.nb_actions - 1) as f64)
            .collect()
    }
}

impl Generator for QueueInstance {
    fn generate(&self) -> Result<TabularMdp> {
        ensure(self.nb_states >= 2, "a queue needs at least two states")?;
        ensure(self.nb_actions >= 1, "a queue needs at least one service rate")?;
        ensure((0.0..=1.0).contains(&self.arrival), "the arrival probability must lie in [0, 1]")?;

        let n = self.nb_states;
        let p = self.arrival;
        let rates = self.service_rates();

        let transitions = rates.iter().map(|q| {
            let mut matrix = vec![vec![0.0; n]; n];
            for (i, row) in matrix.iter_mut().enumerate() {
                if i == 0 {
                    row[0] = 1.0 - p;
                    row[1] = p;
                } else if i == n - 1 {
                    row[i - 1] = *q;
                    row[i] = 1.0 - q;
                } else {
                    row[i - 1] = (1.0 - p) * q;
                    row[i] = (1.0 - p) * (1.0 - q) + p * q;
                    row[i + 1] = p * (1.0 - q);
                }
            }
            matrix
        })
        .collect::<Vec<_>>();

        let rewards = (0..n)
            .map(|s| rates.iter().map(|q| -(s as f64) - 60.0 * q * q * q).collect())
            .collect::<Vec<Vec<f64>>>();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let initial = random_distribution(&mut rng, n);

        Ok(TabularMdp::from_dense(&transitions, &rewards, &initial, self.discount))
    }
}

#[cfg(test)]
mod tests {
    use crate::{Action, Generator, Mdp, MdpModel, QueueInstance, State};
    use crate::test_utils::assert_close;

    #[test]
    fn the_service_rates_are_evenly_spaced() {
        let queue = QueueInstance::new(5, 3, 0.2, 1);
        let rates = queue.service_rates();
        assert_close(0.0, rates[0], 1e-12);
        assert_close(0.4, rates[1], 1e-12);
        assert_close(0.8, rates[2], 1e-12);
    }
    #[test]
    fn a_queue_is_a_proper_mdp() {
        let mdp = QueueInstance::new(6, 3, 0.3, 1).generate().unwrap();
        assert!(MdpModel::new(&mdp).is_ok());
    }
    #[test]
    fn serving_faster_costs_more() {
        let mdp = QueueInstance::new(4, 3, 0.2, 1).generate().unwrap();
        assert_close(-2.0, mdp.reward(State(2), Action(0)), 1e-12);
        assert!(mdp.reward(State(2), Action(2)) < mdp.reward(State(2), Action(1)));
    }
    #[test]
    fn an_empty_queue_may_only_grow() {
        let mdp = QueueInstance::new(4, 2, 0.25, 1).generate().unwrap();
        assert_close(0.75, mdp.transition(State(0), State(0), Action(1)), 1e-12);
        assert_close(0.25, mdp.transition(State(1), State(0), Action(1)), 1e-12);
    }
    #[test]
    fn a_single_state_queue_is_rejected() {
        assert!(QueueInstance::new(1, 2, 0.25, 1).generate().is_err());
    }
}
