// Test intent: verifies the half-complex transform against a direct DFT.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use realfft::RealFftPlanner;
use stftpack::rfft::{FftError, TransformEngine};

/// Direct O(n^2) DFT packed in half-complex order.
fn dft_half_complex(x: &[f32]) -> Vec<f64> {
    let n = x.len();
    let mut out = vec![0.0f64; n];
    for k in 0..=n / 2 {
        let (mut re, mut im) = (0.0f64, 0.0f64);
        for (t, &v) in x.iter().enumerate() {
            let angle = -2.0 * std::f64::consts::PI * (k * t) as f64 / n as f64;
            re += v as f64 * angle.cos();
            im += v as f64 * angle.sin();
        }
        if k == 0 {
            out[0] = re;
        } else if 2 * k < n {
            out[2 * k - 1] = re;
            out[2 * k] = im;
        } else {
            out[n - 1] = re;
        }
    }
    out
}

fn assert_close(actual: &[f32], expected: &[f64], tol: f64) {
    assert_eq!(actual.len(), expected.len());
    for (i, (&a, &e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a as f64 - e).abs() <= tol * (1.0 + e.abs()),
            "index {}: {} vs {}",
            i,
            a,
            e
        );
    }
}

#[test]
fn matches_direct_dft_even_and_odd() {
    let mut rng = StdRng::seed_from_u64(7);
    for n in [2usize, 3, 4, 5, 8, 15, 16, 100, 128, 129] {
        let frame: Vec<f32> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let mut fft = TransformEngine::new(n).unwrap();
        let out = fft.forward_real_transform(&frame).unwrap().to_vec();
        assert_close(&out, &dft_half_complex(&frame), 1e-4);
    }
}

#[test]
fn cosine_lands_in_its_bin() {
    let n = 64;
    let bin = 5;
    let frame: Vec<f32> = (0..n)
        .map(|t| (2.0 * std::f32::consts::PI * bin as f32 * t as f32 / n as f32).cos())
        .collect();
    let mut fft = TransformEngine::new(n).unwrap();
    let out = fft.forward_real_transform(&frame).unwrap();
    // Re X5 sits at index 2*5-1
    assert!((out[2 * bin - 1] - n as f32 / 2.0).abs() < 1e-3);
    let others: f32 = out
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != 2 * bin - 1)
        .map(|(_, v)| v.abs())
        .sum();
    assert!(others < 1e-2, "leakage {}", others);
}

#[test]
fn input_frame_is_left_untouched() {
    let frame = vec![1.0f32, -2.0, 3.0, -4.0, 5.0, -6.0];
    let copy = frame.clone();
    let mut fft = TransformEngine::new(6).unwrap();
    fft.forward_real_transform(&frame).unwrap();
    assert_eq!(frame, copy);
}

#[test]
fn output_buffer_is_reused_between_calls() {
    let mut fft = TransformEngine::new(8).unwrap();
    let first = fft.forward_real_transform(&[1.0; 8]).unwrap();
    let first_ptr = first.as_ptr();
    let kept = first.to_vec();
    let second = fft.forward_real_transform(&[0.0; 8]).unwrap();
    assert_eq!(second.as_ptr(), first_ptr);
    assert!(second.iter().all(|&x| x == 0.0));
    assert!((kept[0] - 8.0).abs() < 1e-6);
}

#[test]
fn repeated_calls_are_deterministic() {
    let mut rng = StdRng::seed_from_u64(11);
    let frame: Vec<f32> = (0..256).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let mut fft = TransformEngine::new(256).unwrap();
    let a = fft.forward_real_transform(&frame).unwrap().to_vec();
    let b = fft.forward_real_transform(&frame).unwrap().to_vec();
    assert_eq!(a, b);
}

#[test]
fn shared_planner_gives_same_result() {
    let mut planner = RealFftPlanner::<f32>::new();
    let mut a = TransformEngine::with_planner(&mut planner, 32).unwrap();
    let mut b = TransformEngine::with_planner(&mut planner, 32).unwrap();
    let frame: Vec<f32> = (0..32).map(|i| i as f32).collect();
    assert_eq!(
        a.forward_real_transform(&frame).unwrap(),
        b.forward_real_transform(&frame).unwrap()
    );
}

#[test]
fn rejects_mismatched_frames() {
    let mut fft = TransformEngine::new(16).unwrap();
    assert_eq!(fft.len(), 16);
    assert!(matches!(
        fft.forward_real_transform(&[0.0; 17]),
        Err(FftError::MismatchedLengths {
            expected: 16,
            actual: 17
        })
    ));
    assert!(matches!(
        fft.forward_real_transform(&[]),
        Err(FftError::MismatchedLengths { .. })
    ));
}
