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

//! This module provides the controller of the decomposition: the loop which
//! alternates between solving the master relaxation and asking the cut
//! generator for the Bellman inequalities violated by its solution.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::{Action, Cut, CutGenerator, Cutoff, Decomposed, DecompositionOptions, Error, FullScan,
    IterationRecord, MasterRelaxation, Mdp, MdpModel, MonotoneScan, NoCutoff, Phase, Result, Seeding,
    Separation, State, Strategy, TimeBudget, persist};

/// This is the decomposition itself. It owns the master relaxation and
/// drives it to optimality with the cuts found by some cut generator.
///
/// # Example
/// ```
/// # use benders_mdp::*;
/// let mut mdp = TabularMdp::new(1, 2, 0.5);
/// mdp.set_transition(State(0), Action(0), State(0), 1.0);
/// mdp.set_transition(State(0), Action(1), State(0), 1.0);
/// mdp.set_reward(State(0), Action(1), 1.0);
/// mdp.set_initial(State(0), 1.0);
///
/// let model     = MdpModel::new(&mdp).unwrap();
/// let options   = DecompositionOptions::default();
/// let generator = FullScan::new(options.tolerance);
/// let cutoff    = NoCutoff;
///
/// let mut decomposition = Decomposition::new(&model, &generator, &cutoff, &options);
/// let outcome = decomposition.run().unwrap();
/// assert_eq!(Phase::Converged, decomposition.phase());
/// assert!((outcome.objective - 2.0).abs() < 1e-6);
/// assert_eq!(vec![Action(1)], outcome.policy);
/// ```
pub struct Decomposition<'a> {
    model: &'a MdpModel,
    generator: &'a dyn CutGenerator,
    cutoff: &'a dyn Cutoff,
    master: MasterRelaxation,
    seeding: Seeding,
    max_iterations: usize,
    phase: Phase,
    history: Vec<IterationRecord>,
    evaluations: usize,
    certification_evaluations: usize,
}

impl<'a> Decomposition<'a> {
    pub fn new(
        model: &'a MdpModel,
        generator: &'a dyn CutGenerator,
        cutoff: &'a dyn Cutoff,
        options: &DecompositionOptions,
    ) -> Self {
        let lower_bound = options.theta_lower_bound.unwrap_or_else(|| model.value_lower_bound());
        let max_iterations = options.max_iterations
            .unwrap_or(model.nb_states() * model.nb_actions() + 1);
        Decomposition {
            model,
            generator,
            cutoff,
            master: MasterRelaxation::new(model, lower_bound, options.feasibility_tolerance),
            seeding: options.seeding,
            max_iterations,
            phase: Phase::Init,
            history: vec![],
            evaluations: 0,
            certification_evaluations: 0,
        }
    }

    /// The phase the decomposition is currently in
    pub fn phase(&self) -> Phase {
        self.phase
    }
    /// The master relaxation, along with all the cuts added so far
    pub fn master(&self) -> &MasterRelaxation {
        &self.master
    }
    /// One record per master solve performed so far
    pub fn history(&self) -> &[IterationRecord] {
        &self.history
    }

    /// Iterates until no Bellman inequality is violated anymore, or until
    /// one of the budgets is exhausted. Whatever the outcome, the phase of
    /// the decomposition is terminal when this method returns.
    pub fn run(&mut self) -> Result<Decomposed> {
        let start = Instant::now();
        info!(
            states = self.model.nb_states(),
            actions = self.model.nb_actions(),
            discount = self.model.discount(),
            "decomposition started"
        );

        let outcome = self.iterate(start);
        match &outcome {
            Ok(done) => {
                self.phase = Phase::Converged;
                info!(
                    objective = done.objective,
                    iterations = done.iterations,
                    cuts = done.nb_cuts,
                    run_time = ?done.run_time,
                    "decomposition converged"
                );
            }
            Err(e) => {
                self.phase = Phase::Failed;
                warn!(error = %e, "decomposition failed");
            }
        }
        outcome
    }

    fn iterate(&mut self, start: Instant) -> Result<Decomposed> {
        if self.phase == Phase::Init {
            self.seed();
            self.phase = Phase::Iterating;
        }

        loop {
            let iteration = self.master.nb_solves();
            if iteration >= self.max_iterations {
                return Err(Error::IterationBudgetExceeded { iterations: iteration });
            }
            if self.cutoff.must_stop() {
                return Err(Error::TimeBudgetExceeded { iterations: iteration });
            }
            let iteration = iteration + 1;

            let solve_time = self.master.solve_time();
            let solution = self.master.solve()?;
            let solve_time = self.master.solve_time() - solve_time;

            let separation = self.generator.separate(self.model, &solution.theta);
            self.evaluations += separation.evaluations;
            self.certification_evaluations += separation.certification_evaluations;
            let mut new_cuts = self.add_cuts(iteration, &separation, &solution.theta)?;

            // a partial scan may only prove convergence once it is certified
            let separation = if new_cuts == 0 && !separation.exhaustive {
                let certified = self.generator.certify(self.model, &solution.theta);
                self.evaluations += certified.evaluations;
                self.certification_evaluations += certified.certification_evaluations;
                new_cuts = self.add_cuts(iteration, &certified, &solution.theta)?;
                certified
            } else {
                separation
            };

            debug!(
                iteration,
                objective = solution.objective,
                violated = separation.violated.len(),
                new_cuts,
                "master solved"
            );
            self.history.push(IterationRecord {
                iteration,
                objective: solution.objective,
                violated: separation.violated.len(),
                new_cuts,
                solve_time,
            });

            if new_cuts == 0 {
                let policy = self.generator.extract_policy(self.model, &solution.theta, &separation)?;
                return Ok(Decomposed {
                    objective: solution.objective,
                    theta: solution.theta,
                    policy,
                    run_time: start.elapsed(),
                    solve_time: self.master.solve_time(),
                    iterations: iteration,
                    nb_cuts: self.master.pool().len(),
                    evaluations: self.evaluations,
                    certification_evaluations: self.certification_evaluations,
                    history: self.history.clone(),
                });
            }
        }
    }

    /// Adds the cut of each violated state to the master and returns the
    /// number of cuts that were actually new.
    ///
    /// A violated state whose cut is already part of the master can only be
    /// explained by the tolerance of the lp solver: it counts as satisfied as
    /// long as the master solution is feasible for that cut.
    fn add_cuts(&mut self, iteration: usize, separation: &Separation, theta: &[f64]) -> Result<usize> {
        let tol = self.master.feasibility_tolerance();
        let mut new_cuts = 0;
        for state in separation.violated.iter().copied() {
            let action = separation.best[state.id()].action;
            if let Some(id) = self.master.pool().find(state, action) {
                let cut = self.master.pool().get(id);
                if cut.residual(theta) < -tol * (1.0 + cut.rhs.abs()) {
                    return Err(Error::Numerical {
                        iteration,
                        detail: format!("the cut of state {} action {} is violated although it is part of the master",
                            state.id(), action.id()),
                    });
                }
            } else if self.master.add_cut(Cut::bellman(self.model, state, action)) {
                new_cuts += 1;
            }
        }
        Ok(new_cuts)
    }

    /// Adds the initial cuts to the master.
    fn seed(&mut self) {
        match self.seeding {
            Seeding::Empty => {}
            Seeding::Myopic => {
                for s in self.model.states() {
                    let action = myopic_action(self.model, s);
                    self.master.add_cut(Cut::bellman(self.model, s, action));
                }
            }
        }
    }
}

/// The action with the largest immediate reward (the lowest index in case
/// of ties)
fn myopic_action(model: &MdpModel, state: State) -> Action {
    let mut best = Action(0);
    for a in model.actions() {
        if model.reward_of(state, a) > model.reward_of(state, best) {
            best = a;
        }
    }
    best
}

/// Decomposes the given model with the given options. This is the one stop
/// shop to solve an mdp: it picks the cut generator matching the strategy,
/// enforces the time budget if there is one, and persists the final master
/// when an output directory is configured.
///
/// The master minimizes $\sum_s \alpha_s \theta_s$, so only the states that
/// are reachable from the support of the initial distribution get pinned to
/// their optimal value. Give every state a positive initial probability when
/// the policy must be optimal everywhere.
///
/// # Example
/// ```
/// # use benders_mdp::*;
/// let mdp = TabularMdp::from_dense(
///     &[
///         vec![vec![0.9, 0.1], vec![0.5, 0.5]],
///         vec![vec![0.2, 0.8], vec![0.1, 0.9]],
///     ],
///     &[vec![1.0, 0.0], vec![0.0, 2.0]],
///     &[0.5, 0.5],
///     0.9);
/// let model   = MdpModel::new(&mdp).unwrap();
/// let outcome = decompose(&model, &DecompositionOptions::default()).unwrap();
///
/// assert_eq!(vec![Action(0), Action(1)], outcome.policy);
/// assert!(outcome.iterations <= 2 * 2 + 1);
/// ```
pub fn decompose(model: &MdpModel, options: &DecompositionOptions) -> Result<Decomposed> {
    let full;
    let monotone;
    let generator: &dyn CutGenerator = match options.strategy {
        Strategy::Unrestricted => {
            full = FullScan::new(options.tolerance).with_nb_threads(options.nb_threads);
            &full
        }
        Strategy::Monotone => {
            monotone = MonotoneScan::new(options.tolerance).with_nb_threads(options.nb_threads);
            &monotone
        }
    };

    let no_cutoff = NoCutoff;
    let time_budget;
    let cutoff: &dyn Cutoff = match options.time_limit {
        Some(budget) => {
            time_budget = TimeBudget::new(budget);
            &time_budget
        }
        None => &no_cutoff,
    };

    let mut decomposition = Decomposition::new(model, generator, cutoff, options);
    let outcome = decomposition.run()?;
    if let Some(dir) = &options.output_dir {
        persist(dir, decomposition.master(), &outcome)?;
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{Action, Cutoff, Decomposition, DecompositionOptions, DecompositionOptionsBuilder,
        Error, FullScan, MdpModel, MonotoneScan, NoCutoff, Phase, Seeding, State, Strategy, TabularMdp, TimeBudget,
        decompose};
    use crate::test_utils::{assert_close, decreasing_chain, ties, toy, toy_values};

    fn options() -> DecompositionOptions {
        DecompositionOptionsBuilder::default().nb_threads(1).build().unwrap()
    }

    #[test]
    fn the_toy_problem_converges_to_its_value_function() {
        let model = MdpModel::new(&toy()).unwrap();
        let outcome = decompose(&model, &options()).unwrap();
        let expected = toy_values();
        assert_close(expected[0], outcome.theta[0], 1e-6);
        assert_close(expected[1], outcome.theta[1], 1e-6);
        assert_close(0.5 * expected[0] + 0.5 * expected[1], outcome.objective, 1e-6);
        assert_eq!(vec![Action(0), Action(1)], outcome.policy);
    }
    #[test]
    fn states_reached_from_the_initial_support_get_an_optimal_action() {
        // state 1 is never reached from state 0 and has no initial mass
        let mut mdp = TabularMdp::new(2, 2, 0.9);
        for a in 0..2 {
            mdp.set_transition(State(0), Action(a), State(0), 1.0);
            mdp.set_transition(State(1), Action(a), State(1), 1.0);
        }
        mdp.set_reward(State(0), Action(0), 1.0);
        mdp.set_reward(State(0), Action(1), 2.0);
        mdp.set_reward(State(1), Action(1), 5.0);
        mdp.set_initial(State(0), 1.0);

        let model = MdpModel::new(&mdp).unwrap();
        let outcome = decompose(&model, &options()).unwrap();
        assert_close(20.0, outcome.objective, 1e-6);
        assert_close(20.0, outcome.theta[0], 1e-6);
        assert_eq!(Action(1), outcome.policy[0]);
        assert!(outcome.theta[1] >= 50.0 - 1e-6);
    }
    #[test]
    fn the_phase_is_terminal_once_run() {
        let model = MdpModel::new(&toy()).unwrap();
        let options = options();
        let generator = FullScan::new(options.tolerance).with_nb_threads(1);
        let mut decomposition = Decomposition::new(&model, &generator, &NoCutoff, &options);
        assert_eq!(Phase::Init, decomposition.phase());
        decomposition.run().unwrap();
        assert_eq!(Phase::Converged, decomposition.phase());
    }
    #[test]
    fn the_history_has_one_record_per_solve() {
        let model = MdpModel::new(&toy()).unwrap();
        let outcome = decompose(&model, &options()).unwrap();
        assert_eq!(outcome.iterations, outcome.history.len());
        assert_eq!(0, outcome.history.last().unwrap().new_cuts);
        for (i, record) in outcome.history.iter().enumerate() {
            assert_eq!(i + 1, record.iteration);
        }
        assert_eq!(outcome.solve_time, outcome.history.iter().map(|r| r.solve_time).sum::<Duration>());
    }
    #[test]
    fn the_objective_never_decreases() {
        let model = MdpModel::new(&toy()).unwrap();
        let outcome = decompose(&model, &options()).unwrap();
        for pair in outcome.history.windows(2) {
            assert!(pair[1].objective >= pair[0].objective - 1e-9);
        }
    }
    #[test]
    fn the_number_of_cuts_is_that_of_the_pool() {
        let model = MdpModel::new(&toy()).unwrap();
        let outcome = decompose(&model, &options()).unwrap();
        let added: usize = outcome.history.iter().map(|r| r.new_cuts).sum();
        assert_eq!(added, outcome.nb_cuts);
        assert!(outcome.nb_cuts <= 4);
    }
    #[test]
    fn the_myopic_seeding_starts_with_one_cut_per_state() {
        let model = MdpModel::new(&toy()).unwrap();
        let options = DecompositionOptionsBuilder::default()
            .nb_threads(1)
            .seeding(Seeding::Myopic)
            .build()
            .unwrap();
        let outcome = decompose(&model, &options).unwrap();
        let added: usize = outcome.history.iter().map(|r| r.new_cuts).sum();
        assert_eq!(added + 2, outcome.nb_cuts);
        assert_close(0.5 * toy_values()[0] + 0.5 * toy_values()[1], outcome.objective, 1e-6);
    }
    #[test]
    fn ties_lead_to_the_lowest_action() {
        let model = MdpModel::new(&ties(5)).unwrap();
        let outcome = decompose(&model, &options()).unwrap();
        assert_eq!(vec![Action(0)], outcome.policy);
        assert_close(2.0, outcome.objective, 1e-6);
    }
    #[test]
    fn a_single_iteration_is_not_enough() {
        let model = MdpModel::new(&toy()).unwrap();
        let options = DecompositionOptionsBuilder::default()
            .nb_threads(1)
            .max_iterations(1)
            .build()
            .unwrap();
        let err = decompose(&model, &options).unwrap_err();
        assert!(matches!(err, Error::IterationBudgetExceeded { iterations: 1 }));
    }
    #[test]
    fn a_failed_run_is_in_the_failed_phase() {
        let model = MdpModel::new(&toy()).unwrap();
        let options = DecompositionOptionsBuilder::default()
            .nb_threads(1)
            .max_iterations(0)
            .build()
            .unwrap();
        let generator = FullScan::new(options.tolerance);
        let mut decomposition = Decomposition::new(&model, &generator, &NoCutoff, &options);
        assert!(decomposition.run().is_err());
        assert_eq!(Phase::Failed, decomposition.phase());
    }
    #[test]
    fn an_exhausted_time_budget_is_reported_as_such() {
        let model = MdpModel::new(&toy()).unwrap();
        let options = options();
        let generator = FullScan::new(options.tolerance);
        let cutoff = TimeBudget::new(Duration::ZERO);
        let mut decomposition = Decomposition::new(&model, &generator, &cutoff, &options);
        let err = decomposition.run().unwrap_err();
        assert!(matches!(err, Error::TimeBudgetExceeded { iterations: 0 }));
    }
    #[test]
    fn both_strategies_agree_on_the_toy_problem() {
        let model = MdpModel::new(&toy()).unwrap();
        let full = decompose(&model, &options()).unwrap();
        let options = DecompositionOptionsBuilder::default()
            .nb_threads(1)
            .strategy(Strategy::Monotone)
            .build()
            .unwrap();
        let monotone = decompose(&model, &options).unwrap();
        assert_close(full.objective, monotone.objective, 1e-6);
        assert_eq!(full.policy, monotone.policy);
        assert!(monotone.certification_evaluations > 0);
    }
    #[test]
    fn the_monotone_strategy_refuses_a_decreasing_optimal_policy() {
        let model = MdpModel::new(&decreasing_chain(4)).unwrap();
        let options = DecompositionOptionsBuilder::default()
            .nb_threads(1)
            .strategy(Strategy::Monotone)
            .build()
            .unwrap();
        let err = decompose(&model, &options).unwrap_err();
        assert!(matches!(err, Error::MonotoneAssumptionViolated { state: 3 }));
    }
    #[test]
    fn the_unrestricted_strategy_solves_a_decreasing_optimal_policy() {
        let model = MdpModel::new(&decreasing_chain(4)).unwrap();
        let outcome = decompose(&model, &options()).unwrap();
        assert_eq!(vec![Action(1), Action(1), Action(0), Action(0)], outcome.policy);
    }

    /// A cutoff which lets a given number of iterations go through
    struct AfterNChecks(std::cell::Cell<usize>);
    impl Cutoff for AfterNChecks {
        fn must_stop(&self) -> bool {
            let left = self.0.get();
            self.0.set(left.saturating_sub(1));
            left == 0
        }
    }
    #[test]
    fn the_cutoff_is_checked_between_iterations() {
        let model = MdpModel::new(&toy()).unwrap();
        let options = options();
        let generator = MonotoneScan::new(options.tolerance);
        let cutoff = AfterNChecks(std::cell::Cell::new(1));
        let mut decomposition = Decomposition::new(&model, &generator, &cutoff, &options);
        let err = decomposition.run().unwrap_err();
        assert!(matches!(err, Error::TimeBudgetExceeded { iterations: 1 }));
        assert_eq!(1, decomposition.history().len());
    }
}
