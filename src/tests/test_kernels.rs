use std::f64::consts::SQRT_2;

use approx::assert_abs_diff_eq;

use crate::kernels::*;

fn grid() -> impl Iterator<Item = f64> {
    (0..=400).map(|i| i as f64 * 0.005)
}

#[test]
fn test_meyer_power_complementary() {
    let h0 = meyer_kernel();
    let h1 = meyer_mirror_kernel();
    for x in grid() {
        let sum = h0.eval(x).powi(2) + h1.eval(x).powi(2);
        assert_abs_diff_eq!(sum, 2.0, epsilon = 1e-12);
    }
    assert_abs_diff_eq!(meyer(0.0), SQRT_2);
    assert_abs_diff_eq!(meyer(2.0), 0.0);
    assert_abs_diff_eq!(meyer(1.0), 1.0, epsilon = 1e-12);
    assert_eq!(h0.name(), "meyer");
    assert_eq!(h1.name(), "meyer_mirror");
}

#[test]
fn test_polyval_and_mirror() {
    // 1 + 2x + 3x^2
    let coeffs = vec![1.0, 2.0, 3.0];
    assert_abs_diff_eq!(polyval(&coeffs, 0.0), 1.0);
    assert_abs_diff_eq!(polyval(&coeffs, 2.0), 17.0);
    assert_abs_diff_eq!(polyval(&[], 3.0), 0.0);

    let p = SpectralKernel::polynomial("p", coeffs);
    let mirrored = p.mirror("p_mirror");
    assert_abs_diff_eq!(mirrored.eval(0.0), 17.0);
    assert_abs_diff_eq!(mirrored.eval(0.5), p.eval(1.5));
    assert_eq!(format!("{:?}", mirrored), "SpectralKernel(p_mirror)");
}

#[test]
fn test_biorth_perfect_reconstruction_identity() {
    for k in 1..=8 {
        let design = design_biorth_kernel(k).unwrap();
        assert!(design.h0.len() <= 2 * k && design.g0.len() <= 2 * k, "k = {}", k);
        assert!(design.orthogonality >= 0.0 && design.orthogonality < 1.0);

        let (h0, h1) = design.analysis_pair();
        let (g0, g1) = design.synthesis_pair();
        for x in grid() {
            let pr = h0.eval(x) * g0.eval(x) + h1.eval(x) * g1.eval(x);
            assert_abs_diff_eq!(pr, 2.0, epsilon = 1e-9);
            // low-pass passes DC, high-pass blocks it
            assert_abs_diff_eq!(h0.eval(0.0) * g0.eval(0.0), 2.0, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(h1.eval(0.0) * g1.eval(0.0), 0.0, epsilon = 1e-12);
    }
}

#[test]
fn test_biorth_k1_is_orthogonal_linear_pair() {
    let design = design_biorth_kernel(1).unwrap();
    // h0 = sqrt(2)(1 - λ/2), g0 = sqrt(2)
    assert_abs_diff_eq!(design.h0[0], SQRT_2, epsilon = 1e-15);
    assert_abs_diff_eq!(design.h0[1], -SQRT_2 / 2.0, epsilon = 1e-15);
    assert_eq!(design.g0, vec![SQRT_2]);
    assert!(design_biorth_kernel(0).is_err());
}
