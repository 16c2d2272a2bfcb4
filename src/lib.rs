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

//! # Benders MDP
//! This crate solves discounted markov decision processes through the linear
//! programming formulation of their optimal value function:
//!
//! $\min \sum_s \alpha_s \theta_s$ subject to
//! $\theta_s \geq R(s,a) + \gamma \sum_{s'} P(s'|s,a) \theta_{s'}$ for every
//! state $s$ and action $a$.
//!
//! Because that lp has one constraint per (state, action) pair, it quickly
//! becomes too large to be built at once. Instead, the constraints (cuts)
//! are generated lazily: a master relaxation holding only a few of them is
//! solved, and the Bellman inequalities violated by its optimal solution are
//! added until none is left. This is a Benders decomposition of the lp,
//! where the subproblem boils down to a one step lookahead on every state.
//!
//! When some optimal policy is known to be monotone (the action played never
//! decreases when the state increases), the lookahead can be restricted to
//! the actions consistent with that structure, which saves most of the
//! evaluations (see `Strategy::Monotone`).
//!
//! ## Quick Example
//! The first thing to do is to describe the mdp. Either implement the `Mdp`
//! trait for your own type or fill a `TabularMdp` as shown hereunder. The
//! mdp is then validated once and for all as an `MdpModel`.
//!
//! ```
//! # use benders_mdp::*;
//! // Two states, two actions, gamma = 0.9 and alpha = [0.5, 0.5]
//! let mdp = TabularMdp::from_dense(
//!     // transitions[a][s][s']
//!     &[
//!         vec![vec![0.9, 0.1], vec![0.5, 0.5]],
//!         vec![vec![0.2, 0.8], vec![0.1, 0.9]],
//!     ],
//!     // rewards[s][a]
//!     &[vec![1.0, 0.0], vec![0.0, 2.0]],
//!     // initial distribution
//!     &[0.5, 0.5],
//!     // discount factor
//!     0.9);
//! let model = MdpModel::new(&mdp).unwrap();
//!
//! // Configure the decomposition (or go with the defaults)
//! let options = DecompositionOptionsBuilder::default()
//!     .strategy(Strategy::Unrestricted)
//!     .build()
//!     .unwrap();
//!
//! // Solve it
//! let outcome = decompose(&model, &options).unwrap();
//!
//! // It agrees with the classical algorithms
//! let check = PolicyIteration::default().solve(&model).unwrap();
//! assert!((outcome.objective - check.objective).abs() < 1e-6);
//! assert_eq!(check.policy, outcome.policy);
//! ```
//!
//! ## Going further
//! The `Decomposition` type lets you plug your own `CutGenerator` and
//! `Cutoff` in the controller. The `demos/decompose` example shows how to
//! run the decomposition on the seeded benchmark families (`RandomInstance`,
//! `QueueInstance`, `InventoryInstance`, `ReplacementInstance` and
//! `TransmissionInstance`).

mod common;
mod abstraction;
mod implementation;

pub use common::*;
pub use abstraction::*;
pub use implementation::*;

#[cfg(test)]
mod test_utils;
