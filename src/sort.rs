//! Row sorting, partial sorting, and interval binary search.
//!
//! Rows are reordered through an index permutation and one scratch pass
//! rather than element-wise cycling, so the cost is O(rows log rows)
//! comparisons plus a single O(rows * cols) copy whatever the stride.
//!
//! Unordered key values (NaN) compare as equal everywhere here; the
//! binary searches additionally require ascending pre-sorted input,
//! which is a documented precondition and not checked at runtime.

use std::cmp::Ordering;

use crate::mat::MatView;
use crate::vec::VecView;

#[inline]
pub(crate) fn cmp_partial<T: PartialOrd>(a: &T, b: &T) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

fn apply_row_permutation<T: Copy>(m: &mut MatView<T>, order: &[usize]) {
    debug_assert_eq!(order.len(), m.rows());
    let mut scratch = Vec::with_capacity(m.size());
    for &src in order {
        for j in 0..m.cols() {
            scratch.push(m.get(src, j));
        }
    }
    let mut k = 0;
    for i in 0..m.rows() {
        for j in 0..m.cols() {
            m.set(i, j, scratch[k]);
            k += 1;
        }
    }
}

/// Stably reorder the rows of `m` in place by the values in column
/// `key_col`.
///
/// Rows with equal keys keep their original relative order, for the
/// descending direction as well.
pub fn sort_rows<T: Copy + PartialOrd>(m: &mut MatView<T>, key_col: usize, increasing: bool) {
    assert!(
        key_col < m.cols(),
        "sort key column {key_col} out of bounds for {} columns",
        m.cols()
    );
    if m.rows() < 2 {
        return;
    }
    let mut order: Vec<usize> = (0..m.rows()).collect();
    order.sort_by(|&a, &b| {
        let ord = cmp_partial(&m.get(a, key_col), &m.get(b, key_col));
        if increasing {
            ord
        } else {
            ord.reverse()
        }
    });
    apply_row_permutation(m, &order);
}

/// Stably reorder the rows of `m` in place by several key columns
/// compared lexicographically, ascending.
pub fn sort_rows_by_columns<T: Copy + PartialOrd>(m: &mut MatView<T>, key_cols: &[usize]) {
    for &c in key_cols {
        assert!(
            c < m.cols(),
            "sort key column {c} out of bounds for {} columns",
            m.cols()
        );
    }
    if m.rows() < 2 {
        return;
    }
    let mut order: Vec<usize> = (0..m.rows()).collect();
    order.sort_by(|&a, &b| {
        for &c in key_cols {
            let ord = cmp_partial(&m.get(a, c), &m.get(b, c));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
    apply_row_permutation(m, &order);
}

/// Rearrange the rows of `m` so the `k` rows with the smallest values in
/// column `key_col` occupy the first `k` positions.
///
/// With `sort_k` those first `k` rows are also mutually sorted
/// ascending; without it they are only guaranteed to be the k smallest
/// as a set. The remaining rows end up in arbitrary order. `k` larger
/// than the row count is a contract violation and panics.
pub fn partial_sort_rows<T: Copy + PartialOrd>(
    m: &mut MatView<T>,
    k: usize,
    sort_k: bool,
    key_col: usize,
) {
    assert!(
        k <= m.rows(),
        "cannot select {k} rows from a matrix with {} rows",
        m.rows()
    );
    assert!(
        key_col < m.cols(),
        "sort key column {key_col} out of bounds for {} columns",
        m.cols()
    );
    if k == 0 || m.rows() < 2 {
        return;
    }
    let rows = m.rows();
    let mut order: Vec<usize> = (0..rows).collect();
    if k < rows {
        order.select_nth_unstable_by(k - 1, |&a, &b| {
            cmp_partial(&m.get(a, key_col), &m.get(b, key_col))
        });
    }
    if sort_k {
        order[..k].sort_by(|&a, &b| cmp_partial(&m.get(a, key_col), &m.get(b, key_col)));
    }
    apply_row_permutation(m, &order);
}

fn interval_search<T, F>(n: usize, key: F, x: T) -> isize
where
    T: Copy + PartialOrd,
    F: Fn(usize) -> T,
{
    if n == 0 || cmp_partial(&x, &key(0)) == Ordering::Less {
        return -1;
    }
    if cmp_partial(&x, &key(n - 1)) != Ordering::Less {
        return n as isize - 1;
    }
    // key(lo) <= x < key(hi)
    let mut lo = 0;
    let mut hi = n - 1;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if cmp_partial(&x, &key(mid)) == Ordering::Less {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    lo as isize
}

/// Greatest index `k` with `v[k] <= x < v[k + 1]` in an ascending
/// pre-sorted vector; `-1` when `x` is below `v[0]`, `len - 1` when `x`
/// is at or above the last element.
///
/// The input must already be sorted ascending; the result on unsorted
/// input is unspecified.
pub fn binary_search<T: Copy + PartialOrd>(v: &VecView<T>, x: T) -> isize {
    interval_search(v.len(), |i| v.get(i), x)
}

/// [`binary_search`] over column `col` of a matrix whose rows are sorted
/// ascending by that column.
pub fn binary_search_column<T: Copy + PartialOrd>(m: &MatView<T>, col: usize, x: T) -> isize {
    assert!(
        col < m.cols(),
        "search column {col} out of bounds for {} columns",
        m.cols()
    );
    interval_search(m.rows(), |i| m.get(i, col), x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mat(rows: usize, cols: usize, values: &[f64]) -> MatView<f64> {
        MatView::from_rows(rows, cols, values).unwrap()
    }

    #[test]
    fn sort_rows_ascending_already_sorted() {
        let mut m = mat(3, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        sort_rows(&mut m, 2, true);
        assert_eq!(m.to_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn sort_rows_descending_reverses() {
        let mut m = mat(3, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        sort_rows(&mut m, 2, false);
        assert_eq!(m.to_vec(), vec![7.0, 8.0, 9.0, 4.0, 5.0, 6.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn sort_rows_is_stable_on_ties() {
        // Key column 0 has ties; column 1 records the original order.
        let mut m = mat(4, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 2.0, 0.0, 3.0]);
        sort_rows(&mut m, 0, true);
        assert_eq!(m.to_vec(), vec![0.0, 1.0, 0.0, 3.0, 1.0, 0.0, 1.0, 2.0]);
        sort_rows(&mut m, 0, false);
        assert_eq!(m.to_vec(), vec![1.0, 0.0, 1.0, 2.0, 0.0, 1.0, 0.0, 3.0]);
    }

    #[test]
    fn sort_rows_on_strided_view() {
        let full = mat(3, 4, &[9.0, 3.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 5.0, 2.0, 0.0, 0.0]);
        let mut s = full.sub_cols(0, 2);
        sort_rows(&mut s, 0, true);
        assert_eq!(s.to_vec(), vec![1.0, 1.0, 5.0, 2.0, 9.0, 3.0]);
        // Padding columns are untouched.
        assert_eq!(full.get(0, 2), 0.0);
    }

    #[test]
    fn lexicographic_sort() {
        let mut m = mat(4, 2, &[2.0, 1.0, 1.0, 2.0, 2.0, 0.0, 1.0, 1.0]);
        sort_rows_by_columns(&mut m, &[0, 1]);
        assert_eq!(m.to_vec(), vec![1.0, 1.0, 1.0, 2.0, 2.0, 0.0, 2.0, 1.0]);
    }

    #[test]
    fn partial_sort_selects_k_smallest() {
        let mut m = mat(5, 2, &[4.0, 0.0, 1.0, 1.0, 3.0, 2.0, 0.0, 3.0, 2.0, 4.0]);
        partial_sort_rows(&mut m, 2, true, 0);
        assert_eq!(m.get(0, 0), 0.0);
        assert_eq!(m.get(1, 0), 1.0);
        let mut rest: Vec<f64> = (2..5).map(|i| m.get(i, 0)).collect();
        rest.sort_by(cmp_partial);
        assert_eq!(rest, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn partial_sort_unsorted_head_is_still_smallest_set() {
        let mut m = mat(5, 1, &[4.0, 1.0, 3.0, 0.0, 2.0]);
        partial_sort_rows(&mut m, 3, false, 0);
        let mut head: Vec<f64> = (0..3).map(|i| m.get(i, 0)).collect();
        head.sort_by(cmp_partial);
        assert_eq!(head, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn partial_sort_full_k_sorts_everything() {
        let mut m = mat(4, 1, &[3.0, 1.0, 0.0, 2.0]);
        partial_sort_rows(&mut m, 4, true, 0);
        assert_eq!(m.to_vec(), vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn partial_sort_checks_key_column_even_when_k_is_zero() {
        let mut m = mat(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        partial_sort_rows(&mut m, 0, false, 5);
    }

    #[test]
    #[should_panic(expected = "cannot select")]
    fn partial_sort_k_too_large_panics() {
        let mut m = mat(2, 1, &[1.0, 2.0]);
        partial_sort_rows(&mut m, 3, true, 0);
    }

    #[test]
    fn binary_search_interval_semantics() {
        let v = VecView::from_slice(&[1.0, 3.0, 3.0, 5.0]);
        assert_eq!(binary_search(&v, 0.0), -1);
        assert_eq!(binary_search(&v, 1.0), 0);
        assert_eq!(binary_search(&v, 2.0), 0);
        assert_eq!(binary_search(&v, 3.0), 2);
        assert_eq!(binary_search(&v, 4.0), 2);
        assert_eq!(binary_search(&v, 5.0), 3);
        assert_eq!(binary_search(&v, 9.0), 3);
        let empty: VecView<f64> = VecView::default();
        assert_eq!(binary_search(&empty, 1.0), -1);
    }

    #[test]
    fn binary_search_column_matches_vector_search() {
        let m = mat(4, 2, &[1.0, 9.0, 3.0, 9.0, 3.0, 9.0, 5.0, 9.0]);
        for x in [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0] {
            assert_eq!(
                binary_search_column(&m, 0, x),
                binary_search(&m.column_copy(0), x)
            );
        }
    }
}
