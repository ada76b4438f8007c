//! Requester × slot valuation matrix.
//!
//! Rows are eligible candidates ordered by requester id, columns are the
//! pool's distinct candidate slots ordered by instant. A cell holds the
//! row's weight when the slot is one of its candidates and the
//! infeasibility sentinel otherwise. The sentinel is more negative than the
//! sum of every weight in the matrix, so no solution ever trades a real pair
//! for an infeasible one.

use chrono::{DateTime, Utc};
use slotgrid_core::RequesterId;

use crate::candidate::Candidate;

#[derive(Debug, Clone)]
pub struct ValuationMatrix {
    requesters: Vec<RequesterId>,
    weights: Vec<u32>,
    slots: Vec<DateTime<Utc>>,
    /// Row-major feasibility: `feasible[row][col]`.
    feasible: Vec<Vec<bool>>,
    infeasible: i64,
}

impl ValuationMatrix {
    /// Build the matrix for a set of eligible candidates.
    pub fn build(candidates: &[&Candidate]) -> Self {
        let mut rows: Vec<&Candidate> = candidates.to_vec();
        rows.sort_by(|a, b| a.requester.cmp(&b.requester));

        let mut slots: Vec<DateTime<Utc>> = rows
            .iter()
            .flat_map(|c| c.slots.iter().copied())
            .collect();
        slots.sort();
        slots.dedup();

        let feasible = rows
            .iter()
            .map(|c| slots.iter().map(|s| c.slots.contains(s)).collect())
            .collect();
        let total: i64 = rows.iter().map(|c| i64::from(c.weight)).sum();

        Self {
            requesters: rows.iter().map(|c| c.requester.clone()).collect(),
            weights: rows.iter().map(|c| c.weight).collect(),
            slots,
            feasible,
            infeasible: -(total + 1),
        }
    }

    pub fn rows(&self) -> usize {
        self.requesters.len()
    }

    pub fn cols(&self) -> usize {
        self.slots.len()
    }

    pub fn requester(&self, row: usize) -> &RequesterId {
        &self.requesters[row]
    }

    pub fn weight(&self, row: usize) -> u32 {
        self.weights[row]
    }

    pub fn slot(&self, col: usize) -> DateTime<Utc> {
        self.slots[col]
    }

    pub fn is_feasible(&self, row: usize, col: usize) -> bool {
        self.feasible[row][col]
    }

    /// The sentinel placed in infeasible cells.
    pub fn infeasible(&self) -> i64 {
        self.infeasible
    }

    /// Cell value: the row's weight, or the sentinel.
    pub fn value(&self, row: usize, col: usize) -> i64 {
        if self.feasible[row][col] {
            i64::from(self.weights[row])
        } else {
            self.infeasible
        }
    }

    /// All cell values, row-major.
    pub fn values(&self) -> Vec<Vec<i64>> {
        (0..self.rows())
            .map(|r| (0..self.cols()).map(|c| self.value(r, c)).collect())
            .collect()
    }

    /// Cell values with a deterministic tie-break folded in.
    ///
    /// Each feasible cell becomes `weight * scale + (R - row)` where `R` is
    /// the row count and `scale` exceeds the largest possible bonus sum, so
    /// a higher total still always wins and equal totals prefer matchings
    /// that cover lower-ranked (smaller id) requesters. Infeasible cells get
    /// a sentinel below the scaled total. Returns `None` if the scaled
    /// values would not fit the solver's arithmetic.
    pub fn tie_broken_values(&self) -> Option<Vec<Vec<i64>>> {
        let r = i64::try_from(self.rows()).ok()?;
        let scale = r.checked_mul(r + 1)? / 2 + 1;

        let mut total: i64 = 0;
        let mut scaled_rows = Vec::with_capacity(self.rows());
        for row in 0..self.rows() {
            let bonus = r - row as i64;
            let scaled = i64::from(self.weights[row])
                .checked_mul(scale)?
                .checked_add(bonus)?;
            total = total.checked_add(scaled)?;
            scaled_rows.push(scaled);
        }
        let sentinel = total.checked_add(1)?;
        if sentinel > crate::hungarian::MAX_MAGNITUDE {
            return None;
        }

        Some(
            scaled_rows
                .iter()
                .enumerate()
                .map(|(row, &scaled)| {
                    (0..self.cols())
                        .map(|col| if self.feasible[row][col] { scaled } else { -sentinel })
                        .collect()
                })
                .collect(),
        )
    }
}
