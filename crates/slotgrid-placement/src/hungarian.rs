//! Hungarian method for the rectangular assignment problem.
//!
//! Maximizes the sum of selected cells. The input is padded to a square
//! matrix with zero-valued dummy rows/columns, converted to a cost
//! minimization (`cost = -value`), and solved with the shortest augmenting
//! path formulation using row/column potentials, O(n³) in the padded size.

/// Largest absolute cell value the solver accepts. Keeps potentials and
/// reduced costs clear of `INF` and of `i64` overflow.
pub const MAX_MAGNITUDE: i64 = i64::MAX / 16;

const INF: i64 = i64::MAX / 4;

/// Solve a maximum-value assignment over `values` (`rows × cols`).
///
/// Returns, per row, the column it was matched to. Rows matched to padding
/// columns get `None`. Every row of a square solution is matched, so callers
/// must discard pairs whose cell value they consider infeasible.
pub fn solve(values: &[Vec<i64>], cols: usize) -> Vec<Option<usize>> {
    let rows = values.len();
    let n = rows.max(cols);
    if n == 0 {
        return Vec::new();
    }

    let cost = |i: usize, j: usize| -> i64 {
        if i < rows && j < cols {
            -values[i][j]
        } else {
            0
        }
    };

    // 1-indexed; index 0 is the virtual root of each augmenting search.
    let mut u = vec![0i64; n + 1];
    let mut v = vec![0i64; n + 1];
    let mut p = vec![0usize; n + 1]; // column -> matched row
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0;
        let mut minv = vec![INF; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = INF;
            let mut j1 = 0;
            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let reduced = cost(i0 - 1, j - 1) - u[i0] - v[j];
                if reduced < minv[j] {
                    minv[j] = reduced;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=n {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        // Flip the augmenting path back to the root.
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![None; rows];
    for j in 1..=n {
        let i = p[j];
        if (1..=rows).contains(&i) && j <= cols {
            assignment[i - 1] = Some(j - 1);
        }
    }
    assignment
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(values: &[Vec<i64>], assignment: &[Option<usize>]) -> i64 {
        assignment
            .iter()
            .enumerate()
            .filter_map(|(row, col)| col.map(|c| values[row][c]))
            .sum()
    }

    #[test]
    fn empty_input() {
        assert!(solve(&[], 0).is_empty());
        assert_eq!(solve(&[vec![], vec![]], 0), vec![None, None]);
    }

    #[test]
    fn square_maximum() {
        let values = vec![vec![7, 5, 1], vec![2, 8, 3], vec![4, 6, 9]];
        let assignment = solve(&values, 3);
        assert_eq!(assignment, vec![Some(0), Some(1), Some(2)]);
        assert_eq!(total(&values, &assignment), 24);
    }

    #[test]
    fn prefers_swap_over_diagonal() {
        let values = vec![vec![10, 9], vec![9, 1]];
        let assignment = solve(&values, 2);
        assert_eq!(assignment, vec![Some(1), Some(0)]);
    }

    #[test]
    fn more_rows_than_columns_leaves_rows_unmatched() {
        let values = vec![vec![3], vec![9], vec![5]];
        let assignment = solve(&values, 1);
        assert_eq!(assignment, vec![None, Some(0), None]);
    }

    #[test]
    fn more_columns_than_rows() {
        let values = vec![vec![1, 4, 2]];
        assert_eq!(solve(&values, 3), vec![Some(1)]);
    }

    #[test]
    fn avoids_sentinel_cells_when_possible() {
        let s = -100;
        let values = vec![vec![30, s], vec![s, 20]];
        assert_eq!(solve(&values, 2), vec![Some(0), Some(1)]);
    }

    #[test]
    fn forced_sentinel_is_reported_for_caller_to_drop() {
        // Both rows only accept column 0; the square solution must place
        // one row on the sentinel column.
        let s = -100;
        let values = vec![vec![30, s], vec![20, s]];
        let assignment = solve(&values, 2);
        assert_eq!(assignment[0], Some(0));
        assert_eq!(assignment[1], Some(1));
        assert_eq!(values[1][1], s);
    }
}
