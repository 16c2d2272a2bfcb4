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

//! Packet transmission over a fading channel (after Krishnamurthy). The
//! state is the pair (channel quality, packets left) and the action picks
//! the effort spent on transmitting the next packet.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{Action, Generator, Result, State, TabularMdp};

use super::{ensure, normalize, random_distribution, DEFAULT_DISCOUNT};

/// The channel evolves as a random markov chain over `nb_channels`
/// qualities, whatever the action. Action 0 waits; action $a > 0$ transmits
/// a packet, which succeeds with a probability that grows with the channel
/// quality, the sharper the larger the effort. Every packet left in the
/// buffer costs a holding fee and transmitting costs more with the effort.
#[derive(Debug, Clone, Copy)]
pub struct TransmissionInstance {
    pub nb_channels: usize,
    pub nb_packets: usize,
    /// The number of transmission efforts (waiting comes on top of these)
    pub nb_efforts: usize,
    pub discount: f64,
    pub seed: u64,
}
impl TransmissionInstance {
    pub fn new(nb_channels: usize, nb_packets: usize, nb_efforts: usize, seed: u64) -> Self {
        TransmissionInstance { nb_channels, nb_packets, nb_efforts, discount: DEFAULT_DISCOUNT, seed }
    }
    /// The index of the state (channel, packets left)
    pub fn state_of(&self, channel: usize, packets: usize) -> State {
        State(channel * (self.nb_packets + 1) + packets)
    }
}

impl Generator for TransmissionInstance {
    fn generate(&self) -> Result<TabularMdp> {
        ensure(self.nb_channels >= 1, "there must be at least one channel quality")?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let nc = self.nb_channels;

        let mut sharpness = (0..self.nb_efforts).map(|_| rng.gen_range(1e-3..1.0)).collect::<Vec<f64>>();
        sharpness.sort_by(f64::total_cmp);
        // success[e][c]: success probability of effort e + 1 on channel c
        let success = sharpness.iter().map(|mu| {
            let sigma = 1.0 / mu;
            let mut pdf = (0..nc)
                .map(|c| {
                    let z = (c as f64 - (nc - 1) as f64) / sigma;
                    (-0.5 * z * z).exp()
                })
                .collect::<Vec<f64>>();
            normalize(&mut pdf);
            pdf
        })
        .collect::<Vec<_>>();

        let mut transmit_cost = (0..self.nb_efforts).map(|_| rng.gen_range(5.0..20.0)).collect::<Vec<f64>>();
        transmit_cost.sort_by(f64::total_cmp);
        let holding_cost = rng.gen_range(0.0..5.0);
        let channel = (0..nc).map(|_| random_distribution(&mut rng, nc)).collect::<Vec<_>>();

        let nb_states = nc * (self.nb_packets + 1);
        let nb_actions = self.nb_efforts + 1;
        let mut mdp = TabularMdp::new(nb_states, nb_actions, self.discount);
        for c in 0..nc {
            for k in 0..=self.nb_packets {
                let s = self.state_of(c, k);
                for a in 0..nb_actions {
                    let action = Action(a);
                    let p = if a == 0 || k == 0 { 0.0 } else { success[a - 1][c] };
                    for (next, q) in channel[c].iter().enumerate() {
                        mdp.add_transition(s, action, self.state_of(next, k), q * (1.0 - p));
                        if p > 0.0 {
                            mdp.add_transition(s, action, self.state_of(next, k - 1), q * p);
                        }
                    }
                    let mut reward = -holding_cost * k as f64;
                    if a > 0 {
                        reward -= transmit_cost[a - 1];
                    }
                    mdp.set_reward(s, action, reward);
                }
            }
        }
        mdp.set_initial_distribution(&random_distribution(&mut rng, nb_states));
        Ok(mdp)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Action, Generator, Mdp, MdpModel, TransmissionInstance};
    use crate::test_utils::assert_close;

    #[test]
    fn a_transmission_is_a_proper_mdp() {
        let instance = TransmissionInstance::new(3, 4, 2, 11);
        let mdp = instance.generate().unwrap();
        let model = MdpModel::new(&mdp).unwrap();
        assert_eq!(15, model.nb_states());
        assert_eq!(3, model.nb_actions());
    }
    #[test]
    fn waiting_never_sends_a_packet() {
        let instance = TransmissionInstance::new(2, 3, 2, 11);
        let mdp = instance.generate().unwrap();
        let stay: f64 = (0..2)
            .map(|c| mdp.transition(instance.state_of(c, 2), instance.state_of(1, 2), Action(0)))
            .sum();
        assert_close(1.0, stay, 1e-9);
    }
    #[test]
    fn an_empty_buffer_stays_empty() {
        let instance = TransmissionInstance::new(2, 3, 2, 11);
        let mdp = instance.generate().unwrap();
        for c in 0..2 {
            for next in 0..2 {
                for k in 1..=3 {
                    assert_eq!(0.0, mdp.transition(instance.state_of(next, k), instance.state_of(c, 0), Action(2)));
                }
            }
        }
    }
    #[test]
    fn transmitting_costs_more_than_waiting() {
        let instance = TransmissionInstance::new(2, 3, 2, 11);
        let mdp = instance.generate().unwrap();
        let s = instance.state_of(1, 3);
        assert!(mdp.reward(s, Action(1)) < mdp.reward(s, Action(0)));
        assert!(mdp.reward(s, Action(2)) <= mdp.reward(s, Action(1)));
    }
}
