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

//! This module lets one persist the final master relaxation and its solution
//! for offline inspection. The model is written in the (CPLEX) LP text format
//! which most lp solvers are able to read back; the solution is written as
//! json.

use std::{fs::{self, File}, io::{BufWriter, Write}, path::Path};

use serde::Serialize;
use tracing::info;

use crate::{Decomposed, MasterRelaxation, Result};

/// The name of the file holding the master model
pub const MODEL_FILE: &str = "master.lp";
/// The name of the file holding the solution of the master
pub const SOLUTION_FILE: &str = "solution.json";

impl MasterRelaxation {
    /// Writes the relaxation (objective, cuts and bounds) in LP format.
    pub fn write_lp<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "\\ master relaxation with {} cuts", self.pool().len())?;
        writeln!(out, "Minimize")?;
        write!(out, " obj:")?;
        let mut first = true;
        for (s, alpha) in self.objective_coefficients().iter().enumerate() {
            if *alpha != 0.0 {
                write!(out, " {}", term(*alpha, s, first))?;
                first = false;
            }
        }
        if first {
            write!(out, " 0 theta_0")?;
        }
        writeln!(out)?;

        writeln!(out, "Subject To")?;
        for cut in self.pool().iter() {
            write!(out, " cut_s{}_a{}:", cut.state.id(), cut.action.id())?;
            for (i, (s, c)) in cut.coefficients.iter().enumerate() {
                write!(out, " {}", term(*c, *s, i == 0))?;
            }
            writeln!(out, " >= {:e}", cut.rhs)?;
        }

        writeln!(out, "Bounds")?;
        for s in 0..self.objective_coefficients().len() {
            writeln!(out, " theta_{s} >= {:e}", self.lower_bound())?;
        }
        writeln!(out, "End")
    }
}

fn term(coefficient: f64, state: usize, first: bool) -> String {
    match (first, coefficient < 0.0) {
        (true, _) => format!("{:e} theta_{state}", coefficient),
        (false, true) => format!("- {:e} theta_{state}", -coefficient),
        (false, false) => format!("+ {:e} theta_{state}", coefficient),
    }
}

#[derive(Serialize)]
struct SolutionFile<'a> {
    objective: f64,
    iterations: usize,
    nb_cuts: usize,
    run_time_secs: f64,
    solve_time_secs: f64,
    theta: &'a [f64],
    policy: Vec<usize>,
    history: &'a [crate::IterationRecord],
}

/// Writes the master model and the solution of a decomposition in `dir`
/// (which is created if needed).
pub fn persist(dir: &Path, master: &MasterRelaxation, outcome: &Decomposed) -> Result<()> {
    fs::create_dir_all(dir)?;

    let mut model = BufWriter::new(File::create(dir.join(MODEL_FILE))?);
    master.write_lp(&mut model)?;
    model.flush()?;

    let solution = SolutionFile {
        objective: outcome.objective,
        iterations: outcome.iterations,
        nb_cuts: outcome.nb_cuts,
        run_time_secs: outcome.run_time.as_secs_f64(),
        solve_time_secs: outcome.solve_time.as_secs_f64(),
        theta: &outcome.theta,
        policy: outcome.policy.iter().map(|a| a.id()).collect(),
        history: &outcome.history,
    };
    let mut file = BufWriter::new(File::create(dir.join(SOLUTION_FILE))?);
    serde_json::to_writer_pretty(&mut file, &solution)?;
    file.flush()?;

    info!(dir = %dir.display(), "master and solution persisted");
    Ok(())
}
