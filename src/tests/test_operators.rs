use approx::assert_abs_diff_eq;
use ndarray::{Array1, Array3};

use crate::builder::FilterBankBuilder;
use crate::decomposition::{DecompositionStrategy, Strategy};
use crate::errors::QmfError;
use crate::harary::Harary;
use crate::operators::*;
use crate::tests::init;
use crate::tests::test_helpers::{random_graph, random_signal, relative_error, sum_channels};

#[test]
fn test_qmf_operator_matches_channel_sum() {
    init();
    let graph = random_graph(16, 0.25, 10);
    for strategy in [Strategy::Harary, Strategy::Amfs] {
        let decomposition = strategy.decompose(&graph, None).unwrap();
        let operator = QmfOperator::new(&decomposition.bipartite, &decomposition.beta, 24, 2.0).unwrap();
        let qmf = FilterBankBuilder::from_decomposition(&decomposition).build().unwrap();

        let x = random_signal(16, 2, 1);
        let y = operator.transform(&x).unwrap();
        let expected = sum_channels(&qmf.analyze(&x.column(0)).unwrap());
        for v in 0..16 {
            assert_abs_diff_eq!(y[[v, 0]], expected[[v, 0]], epsilon = 1e-9);
        }

        // Tᵀ T is the channel-summed synthesis of the analysis
        let x_back = operator.inverse_transform(&y).unwrap();
        let y_full = qmf.analyze(&x.column(0)).unwrap();
        let reconstructed = qmf.reconstruct(&y_full).unwrap();
        for v in 0..16 {
            assert_abs_diff_eq!(x_back[[v, 0]], reconstructed[[v, 0]], epsilon = 1e-9);
        }
    }
}

#[test]
fn test_qmf_operator_keeps_rank() {
    init();
    let graph = random_graph(10, 0.2, 3);
    let decomposition = Harary::new().decompose(&graph, None).unwrap();
    let operator = QmfOperator::new(&decomposition.bipartite, &decomposition.beta, 16, 2.0).unwrap();
    assert_eq!(operator.order(), 16);
    assert_eq!(operator.lam_max(), 2.0);

    let x = Array1::from_elem(10, 1.0);
    assert_eq!(operator.transform(&x).unwrap().dim(), 10);
    assert_eq!(operator.inverse_transform(&random_signal(10, 3, 0)).unwrap().dim(), (10, 3));

    assert!(matches!(
        operator.transform(&Array3::<f64>::zeros((1, 10, 1))),
        Err(QmfError::SignalRank { rank: 3 })
    ));
    assert!(matches!(
        operator.transform(&Array1::<f64>::zeros(9)),
        Err(QmfError::VertexMismatch { expected: 10, got: 9 })
    ));
    assert!(QmfOperator::new(&decomposition.bipartite, &decomposition.beta, 0, 2.0).is_err());
}

#[test]
fn test_biorth_operator_inverts() {
    init();
    let graph = random_graph(18, 0.2, 17);
    let decomposition = Harary::new().decompose(&graph, None).unwrap();
    let operator = BiorthOperator::new(&decomposition.bipartite, &decomposition.beta, 4, 2.0).unwrap();
    assert!(operator.orthogonality() >= 0.0);

    let x = random_signal(18, 2, 6);
    let y = operator.transform(&x).unwrap();
    let x_hat = operator.inverse_transform(&y).unwrap();
    assert!(relative_error(&x_hat, &x) < 1e-9);
}
