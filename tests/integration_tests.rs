use approx::assert_abs_diff_eq;
use nalgebra::DMatrix;
use sg_movmean::{
    design_matrix, movmean, movmean2, movmean_2d, projection_matrix, smooth_sg, smooth_wsg,
    weighted_projection_matrix, SavitzkyGolayFilter, SmoothError, DEFAULT_DESIGN_DEGREE,
    DEFAULT_DESIGN_HALFWIN, DEFAULT_ROWWISE_WIN_LEFT, DEFAULT_ROWWISE_WIN_RIGHT,
};

#[test]
fn test_design_matrix_layout() {
    let s = design_matrix(2, 2);
    let rows: Vec<Vec<f64>> = s.row_iter().map(|r| r.iter().copied().collect()).collect();
    assert_eq!(rows[0], vec![1.0, -2.0, 4.0]);
    assert_eq!(rows[2], vec![1.0, 0.0, 0.0]);
    assert_eq!(rows[4], vec![1.0, 2.0, 4.0]);

    let default = design_matrix(DEFAULT_DESIGN_HALFWIN, DEFAULT_DESIGN_DEGREE);
    assert_eq!(default.shape(), (11, 3));
}

#[test]
fn test_projection_rows_preserve_constants() {
    for (halfwin, degree) in [(1, 0), (2, 2), (5, 3), (7, 4)] {
        let b = projection_matrix(&design_matrix(halfwin, degree)).unwrap();
        let constant = vec![4.2; 2 * halfwin + 1];
        for row in b.row_iter() {
            let value: f64 = row.iter().zip(&constant).map(|(c, v)| c * v).sum();
            assert_abs_diff_eq!(value, 4.2, epsilon = 1e-9);
        }
    }
}

#[test]
fn test_unit_weighted_projection_equals_unweighted() {
    for (halfwin, degree) in [(1, 1), (3, 2), (4, 4)] {
        let s = design_matrix(halfwin, degree);
        let b = projection_matrix(&s).unwrap();
        let wb = weighted_projection_matrix(&s, &vec![1.0; 2 * halfwin + 1]).unwrap();
        for (a, e) in wb.iter().zip(b.iter()) {
            assert_abs_diff_eq!(a, e, epsilon = 1e-10);
        }
    }
}

#[test]
fn test_polynomial_preservation() {
    // Cubic signal, smoothed with degrees 3 and 4
    let data: Vec<f64> = (0..15)
        .map(|i| {
            let x = i as f64;
            0.1 * x.powi(3) - 2.0 * x.powi(2) + x + 1.0
        })
        .collect();

    for degree in [3, 4] {
        let unweighted = smooth_sg(&data, 3, degree).unwrap();
        let weighted = smooth_wsg(&data, 3, degree, None).unwrap();
        for i in 0..data.len() {
            assert_abs_diff_eq!(data[i], unweighted[i], epsilon = 1e-6);
            assert_abs_diff_eq!(data[i], weighted[i], epsilon = 1e-6);
        }
    }
}

#[test]
fn test_constant_preservation() {
    let constant = vec![5.0; 20];
    let weights: Vec<f64> = (0..20).map(|i| 0.5 + (i % 3) as f64).collect();

    for halfwin in [0, 1, 3] {
        for out in [
            movmean(&constant, halfwin, false, None).unwrap(),
            movmean(&constant, halfwin, false, Some(&weights)).unwrap(),
            movmean(&constant, halfwin, true, Some(&weights)).unwrap(),
            movmean2(&constant, halfwin, 2, Some(&weights)).unwrap(),
        ] {
            for value in out {
                assert_abs_diff_eq!(value, 5.0, epsilon = 1e-10);
            }
        }
    }
}

#[test]
fn test_movmean_boundaries() {
    let out = movmean(&[1.0, 2.0, 3.0, 4.0, 5.0], 2, false, None).unwrap();
    assert_eq!(out[2], 3.0);
    assert_eq!(out[0], 2.0);
}

#[test]
fn test_missing_value_locality() {
    let clean: Vec<f64> = (0..30).map(|i| (i as f64 * 0.4).sin() * 10.0).collect();
    let k = 12;
    let mut gappy = clean.clone();
    gappy[k] = f64::NAN;

    let (win_left, win_right) = (3, 2);
    let before = movmean2(&clean, win_left, win_right, None).unwrap();
    let after = movmean2(&gappy, win_left, win_right, None).unwrap();

    for i in 0..clean.len() {
        let begin = i.saturating_sub(win_left);
        let end = (i + win_right).min(clean.len() - 1);
        if (begin..=end).contains(&k) {
            let finite: Vec<f64> = (begin..=end).filter(|&j| j != k).map(|j| clean[j]).collect();
            let expected = finite.iter().sum::<f64>() / finite.len() as f64;
            assert_abs_diff_eq!(after[i], expected, epsilon = 1e-10);
        } else {
            assert_eq!(after[i], before[i]);
        }
    }
}

#[test]
fn test_rowwise_matches_single_sequence() {
    let mat = DMatrix::from_fn(5, 12, |i, j| {
        if (i + j) % 7 == 0 {
            f64::NAN
        } else {
            (i as f64 + 1.0) * (j as f64 * 0.3).cos()
        }
    });

    let out = movmean_2d(&mat, DEFAULT_ROWWISE_WIN_LEFT, DEFAULT_ROWWISE_WIN_RIGHT);
    assert_eq!(out.shape(), mat.shape());

    for i in 0..mat.nrows() {
        let row: Vec<f64> = mat.row(i).iter().copied().collect();
        let expected = movmean2(&row, 3, 0, None).unwrap();
        for (j, e) in expected.iter().enumerate() {
            if e.is_nan() {
                assert!(out[(i, j)].is_nan());
            } else {
                assert_eq!(out[(i, j)], *e);
            }
        }
    }
}

#[test]
fn test_gappy_series_smoothing() {
    // Quadratic trend with scattered gaps is recovered exactly by a weighted degree-2 fit
    let mut data: Vec<f64> = (0..40).map(|i| 0.05 * (i as f64).powi(2) - i as f64).collect();
    let truth = data.clone();
    for &k in &[3, 17, 18, 30] {
        data[k] = f64::NAN;
    }

    let smoothed = smooth_wsg(&data, 3, 2, None).unwrap();
    for (t, s) in truth.iter().zip(smoothed.iter()) {
        assert_abs_diff_eq!(t, s, epsilon = 1e-8);
    }
}

#[test]
fn test_noise_reduction() {
    let true_signal: Vec<f64> = (0..50).map(|i| (i as f64 * 0.1).sin()).collect();
    let mut noisy_signal = true_signal.clone();
    for (i, value) in noisy_signal.iter_mut().enumerate() {
        *value += 0.1 * (i as f64 * 1.7).sin();
    }

    let mse = |other: &[f64]| {
        true_signal
            .iter()
            .zip(other)
            .map(|(t, o)| (t - o).powi(2))
            .sum::<f64>()
            / true_signal.len() as f64
    };

    let filter = SavitzkyGolayFilter::new(4, 3).unwrap();
    let smoothed = filter.apply(&noisy_signal).unwrap();
    assert!(mse(&smoothed) < mse(&noisy_signal));
}

#[test]
fn test_invalid_parameters() {
    assert_eq!(
        smooth_sg(&[1.0, 2.0, 3.0], 2, 1),
        Err(SmoothError::InvalidWindow { frame: 5, len: 3 })
    );
    assert_eq!(
        smooth_wsg(&[1.0; 10], 1, 3, None),
        Err(SmoothError::InvalidDegree { degree: 3, frame: 3 })
    );
    assert!(matches!(
        movmean(&[1.0, 2.0], 1, false, Some(&[1.0])),
        Err(SmoothError::LengthMismatch { expected: 2, got: 1 })
    ));
}

#[test]
fn test_large_series_with_gaps() {
    let mut data: Vec<f64> = (0..10_000).map(|i| (i as f64 * 0.001).sin()).collect();
    for i in (0..data.len()).step_by(97) {
        data[i] = f64::NAN;
    }

    let smoothed = smooth_wsg(&data, 5, 3, None).unwrap();
    assert_eq!(smoothed.len(), data.len());
    assert!(smoothed.iter().all(|v| v.is_finite()));
}
