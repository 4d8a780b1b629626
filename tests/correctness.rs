use std::rc::Rc;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use matview::{
    binary_search, binary_search_column, partial_sort_rows, read_mat_explicit, read_vec, sort_rows,
    sort_rows_by_columns, write_mat_explicit, write_vec, MatView, VecView,
};

fn iota_mat(rows: usize, cols: usize) -> MatView<f64> {
    let mut m = MatView::new(rows, cols);
    for i in 0..rows {
        for j in 0..cols {
            m.set(i, j, (i * cols + j + 1) as f64);
        }
    }
    m
}

fn random_mat(rng: &mut StdRng, rows: usize, cols: usize, key_range: u32) -> MatView<f64> {
    let mut m = MatView::new(rows, cols);
    for i in 0..rows {
        for j in 0..cols {
            m.set(i, j, rng.gen_range(0..key_range) as f64);
        }
    }
    m
}

#[test]
fn deep_copy_never_aliases() {
    let v = VecView::from_slice(&[1.0, 2.0, 3.0]);
    let mut c = v.deep_copy();
    assert_eq!(c, v);
    c.set(0, 99.0);
    assert_eq!(v.get(0), 1.0);

    let m = iota_mat(2, 3);
    let mut mc = m.deep_copy();
    assert_eq!(mc, m);
    mc.set(1, 1, -1.0);
    assert_eq!(m.get(1, 1), 5.0);
}

#[test]
fn element_copy_ignores_stride_and_offset() {
    // Source: a strided, offset sub-matrix. Destination: a vector view
    // into the middle of another storage.
    let src_parent = iota_mat(4, 5);
    let src = src_parent.sub_mat(1, 2, 2, 3);

    let dst_parent = VecView::from_slice(&[0.0; 10]);
    let mut dst = dst_parent.sub_vec(2, 6);
    dst.copy_from_mat(&src);
    assert_eq!(dst.to_vec(), src.to_vec());
    assert_eq!(dst_parent.get(2), src.get(0, 0));
    assert_eq!(dst_parent.get(0), 0.0);

    // And matrix-to-matrix between different strides.
    let strided_dst_parent = iota_mat(3, 4);
    let mut strided_dst = strided_dst_parent.sub_mat(0, 1, 2, 3);
    strided_dst.copy_from(&src);
    assert_eq!(strided_dst.to_vec(), src.to_vec());
    assert_eq!(strided_dst_parent.get(0, 1), src.get(0, 0));
}

#[test]
fn compactness_and_element_iteration() {
    let m = iota_mat(3, 4);
    assert!(m.is_compact());
    assert_eq!(m.stride(), m.cols());
    let visited: Vec<f64> = m.iter().collect();
    assert_eq!(visited.len(), m.rows() * m.cols());
    let mut k = 0;
    for i in 0..m.rows() {
        for j in 0..m.cols() {
            assert_eq!(visited[k], m.get(i, j));
            k += 1;
        }
    }

    let s = m.sub_cols(1, 2);
    assert!(!s.is_compact());
    assert_ne!(s.stride(), s.cols());
    assert_eq!(s.iter().count(), s.rows() * s.cols());
}

#[test]
fn resize_with_current_dimensions_is_idempotent() {
    let mut m = iota_mat(3, 4);
    let before = m.storage().map(Rc::as_ptr);
    let contents = m.to_vec();
    m.resize(3, 4);
    m.resize_with(3, 4, 0, true);
    assert_eq!(m.storage().map(Rc::as_ptr), before);
    assert_eq!(m.to_vec(), contents);
}

#[test]
fn resize_preserve_keeps_surviving_coordinates() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut m = random_mat(&mut rng, 5, 7, 1000);
    let before = m.deep_copy();
    m.resize_with(8, 9, 0, true);
    for i in 0..5 {
        for j in 0..7 {
            assert_eq!(m.get(i, j), before.get(i, j));
        }
    }
    // Shrinking afterwards keeps the overlap too.
    m.resize_with(3, 4, 0, true);
    for i in 0..3 {
        for j in 0..4 {
            assert_eq!(m.get(i, j), before.get(i, j));
        }
    }
}

#[test]
fn sub_views_alias_both_directions() {
    let mut m = iota_mat(4, 4);
    let mut s = m.sub_mat(1, 1, 2, 2);
    s.set(0, 0, -5.0);
    assert_eq!(m.get(1, 1), -5.0);
    m.set(2, 2, -6.0);
    assert_eq!(s.get(1, 1), -6.0);

    let v = VecView::from_slice(&[1, 2, 3, 4, 5]);
    let mut sv = v.sub_vec(1, 3);
    sv.set(1, 0);
    assert_eq!(v.get(2), 0);
}

#[test]
fn sort_rows_is_stable() {
    let mut rng = StdRng::seed_from_u64(11);
    // Column 0: key with many ties. Column 1: original row index.
    let rows = 200;
    let mut m = MatView::new(rows, 2);
    for i in 0..rows {
        m.set(i, 0, rng.gen_range(0..5) as f64);
        m.set(i, 1, i as f64);
    }
    let original = m.deep_copy();
    sort_rows(&mut m, 0, true);
    for i in 1..rows {
        let (ka, kb) = (m.get(i - 1, 0), m.get(i, 0));
        assert!(ka <= kb, "keys out of order at row {i}");
        if ka == kb {
            assert!(
                m.get(i - 1, 1) < m.get(i, 1),
                "tie order changed at row {i}"
            );
        }
    }
    // Same multiset of rows.
    let mut got: Vec<(u64, u64)> = (0..rows)
        .map(|i| (m.get(i, 0) as u64, m.get(i, 1) as u64))
        .collect();
    let mut want: Vec<(u64, u64)> = (0..rows)
        .map(|i| (original.get(i, 0) as u64, original.get(i, 1) as u64))
        .collect();
    got.sort_unstable();
    want.sort_unstable();
    assert_eq!(got, want);
}

#[test]
fn multi_key_sort_orders_lexicographically() {
    let mut rng = StdRng::seed_from_u64(13);
    let mut m = random_mat(&mut rng, 120, 3, 4);
    sort_rows_by_columns(&mut m, &[0, 1]);
    for i in 1..m.rows() {
        let a = (m.get(i - 1, 0), m.get(i - 1, 1));
        let b = (m.get(i, 0), m.get(i, 1));
        assert!(a <= b, "lexicographic order violated at row {i}");
    }
}

#[test]
fn partial_sort_head_is_the_k_smallest_multiset() {
    let mut rng = StdRng::seed_from_u64(17);
    let base = random_mat(&mut rng, 40, 2, 30);
    let mut all_keys: Vec<f64> = (0..40).map(|i| base.get(i, 0)).collect();
    all_keys.sort_by(|a, b| a.partial_cmp(b).unwrap());
    for k in 0..=40 {
        for sort_k in [false, true] {
            let mut m = base.deep_copy();
            partial_sort_rows(&mut m, k, sort_k, 0);
            let mut head: Vec<f64> = (0..k).map(|i| m.get(i, 0)).collect();
            head.sort_by(|a, b| a.partial_cmp(b).unwrap());
            assert_eq!(head, all_keys[..k], "k = {k}, sort_k = {sort_k}");
            if sort_k {
                for i in 1..k {
                    assert!(m.get(i - 1, 0) <= m.get(i, 0));
                }
            }
        }
    }
}

#[test]
fn transpose_is_an_involution() {
    let mut rng = StdRng::seed_from_u64(19);
    let mut m = random_mat(&mut rng, 9, 9, 1000);
    let original = m.deep_copy();
    m.transpose();
    assert_eq!(m.get(0, 8), original.get(8, 0));
    m.transpose();
    assert_eq!(m, original);
}

#[test]
fn binary_search_matches_linear_scan() {
    let mut rng = StdRng::seed_from_u64(23);
    let mut keys: Vec<i64> = (0..50).map(|_| rng.gen_range(0..40)).collect();
    keys.sort_unstable();
    let v = VecView::from_slice(&keys);
    for x in -1..42i64 {
        let expect = (0..keys.len())
            .rev()
            .find(|&k| keys[k] <= x)
            .map_or(-1, |k| k as isize);
        assert_eq!(binary_search(&v, x), expect, "x = {x}");
    }

    let mut m = MatView::new(keys.len(), 2);
    for (i, &key) in keys.iter().enumerate() {
        m.set(i, 0, key as f64);
        m.set(i, 1, i as f64);
    }
    for x in -1..42i64 {
        assert_eq!(
            binary_search_column(&m, 0, x as f64),
            binary_search(&v, x),
            "x = {x}"
        );
    }
}

#[test]
fn push_after_resize_extends_vector() {
    let mut v: VecView<f64> = VecView::default();
    v.resize(3);
    v.fill(0.0);
    v.push(5.0);
    v.push(7.0);
    assert_eq!(v.len(), 5);
    assert_eq!(v.to_vec(), vec![0.0, 0.0, 0.0, 5.0, 7.0]);
}

#[test]
fn sort_rows_both_directions_3x3() {
    let mut m = iota_mat(3, 3);
    sort_rows(&mut m, 2, true);
    assert_eq!(m.to_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    sort_rows(&mut m, 2, false);
    assert_eq!(m.to_vec(), vec![7.0, 8.0, 9.0, 4.0, 5.0, 6.0, 1.0, 2.0, 3.0]);
}

#[test]
fn transpose_2x2_swaps_off_diagonal() {
    let mut m = MatView::new(2, 2);
    m.set(0, 0, 1);
    m.set(0, 1, 2);
    m.set(1, 0, 3);
    m.set(1, 1, 4);
    m.transpose();
    assert_eq!(m.get(0, 1), 3);
    assert_eq!(m.get(1, 0), 2);
    assert_eq!(m.get(0, 0), 1);
    assert_eq!(m.get(1, 1), 4);
}

#[test]
fn codec_round_trips_preserve_values_and_layout() {
    let mut rng = StdRng::seed_from_u64(29);
    let parent = random_mat(&mut rng, 6, 8, 1000);
    let view = parent.sub_mat(2, 3, 3, 4);

    let mut buf = Vec::new();
    write_mat_explicit(&mut buf, &view).unwrap();
    let back: MatView<f64> = read_mat_explicit(&mut buf.as_slice()).unwrap();
    assert_eq!(back.stride(), view.stride());
    assert_eq!(back.offset(), view.offset());
    for i in 0..view.rows() {
        for j in 0..view.cols() {
            assert_relative_eq!(back.get(i, j), view.get(i, j));
        }
    }

    let v = view.row(1);
    let mut buf = Vec::new();
    write_vec(&mut buf, &v).unwrap();
    let vback: VecView<f64> = read_vec(&mut buf.as_slice()).unwrap();
    assert_eq!(vback, v);
}

#[test]
fn symmetry_tolerance_accepts_roundoff() {
    let mut m = MatView::new(3, 3);
    for i in 0..3 {
        for j in 0..3 {
            m.set(i, j, (i + j) as f64);
        }
    }
    assert!(m.is_symmetric(true, false));
    m.set(0, 2, 2.0 + 1e-12);
    assert!(!m.is_symmetric(true, false));
    assert!(m.is_symmetric(false, false));
    assert_relative_eq!(m.get(0, 2), m.get(2, 0), epsilon = 1e-9);
}
