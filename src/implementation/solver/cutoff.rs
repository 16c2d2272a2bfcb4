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

//! This module provides the implementation of the cutoffs which can be used
//! to stop a decomposition before it converges.

use std::time::{Duration, Instant};

use crate::Cutoff;

/// _This is the default cutoff._ It lets the decomposition iterate until it
/// converges (or exhausts its iteration budget).
#[derive(Debug, Default, Copy, Clone)]
pub struct NoCutoff;
impl Cutoff for NoCutoff {
    fn must_stop(&self) -> bool {false}
}

/// This cutoff allows one to specify a maximum time budget for the
/// decomposition. The clock starts ticking when the cutoff is created.
#[derive(Debug, Copy, Clone)]
pub struct TimeBudget {
    deadline: Instant,
}
impl TimeBudget {
    pub fn new(budget: Duration) -> Self {
        TimeBudget { deadline: Instant::now() + budget }
    }
}
impl Cutoff for TimeBudget {
    fn must_stop(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{Cutoff, NoCutoff, TimeBudget};

    #[test]
    fn no_cutoff_never_stops() {
        assert!(!NoCutoff.must_stop());
    }
    #[test]
    fn an_empty_time_budget_stops_immediately() {
        assert!(TimeBudget::new(Duration::ZERO).must_stop());
    }
    #[test]
    fn a_long_time_budget_does_not_stop_right_away() {
        assert!(!TimeBudget::new(Duration::from_secs(3600)).must_stop());
    }
}
