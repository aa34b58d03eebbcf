#![cfg(test)]

use ndarray::Array1;

use crate::{
    MlErr,
    loader::{self, LayerLayout, LayerSpec},
};

fn letter_layout() -> LayerLayout {
    let dense = |name: &str, inputs, outputs| LayerSpec {
        name: name.into(),
        kernel_shape: [inputs, outputs],
        bias_shape: [outputs],
    };

    LayerLayout {
        layers: vec![
            dense("dense", 42, 128),
            dense("dense_1", 128, 64),
            dense("dense_2", 64, 28),
        ],
    }
}

/// Deterministic, non trivial weights in [-0.5, 0.5).
fn weights(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| ((i * 17 + 31) % 100) as f32 / 100. - 0.5)
        .collect()
}

fn to_bytes(blob: &[f32]) -> Vec<u8> {
    bytemuck::cast_slice(blob).to_vec()
}

#[test]
fn test_load_letter_network() {
    let layout = letter_layout();
    let blob = weights(layout.num_params().unwrap());
    let model = loader::build(&layout, &blob).unwrap();

    assert_eq!(model.size(), blob.len());
    assert_eq!(model.input_width(), 42);
    assert_eq!(model.output_width(), 28);
}

#[test]
fn test_blob_one_float_short_is_corrupt() {
    let layout = letter_layout();
    let blob = weights(layout.num_params().unwrap() - 1);

    let err = loader::build(&layout, &blob).unwrap_err();
    assert!(err.is_corrupt(), "{err}");
}

#[test]
fn test_blob_one_float_long_is_corrupt() {
    let layout = letter_layout();
    let blob = weights(layout.num_params().unwrap() + 1);

    let err = loader::build(&layout, &blob).unwrap_err();
    assert!(matches!(err, MlErr::TrailingParams { remaining: 1 }));
}

#[test]
fn test_forward_is_a_distribution_and_deterministic() {
    let layout = letter_layout();
    let model = loader::build(&layout, &weights(layout.num_params().unwrap())).unwrap();
    let x = Array1::from_iter((0..42).map(|i| (i as f32 * 0.37).sin() * 0.1));

    let p = model.forward(x.view()).unwrap();
    assert_eq!(p.len(), 28);
    assert!((p.sum() - 1.).abs() < 1e-4);
    assert!(p.iter().all(|&v| (0. ..=1.).contains(&v)));

    let q = model.forward(x.view()).unwrap();
    assert_eq!(p, q);
}

#[test]
fn test_load_from_bytes_and_document() {
    let layout = letter_layout();
    let doc = serde_json::to_string(&layout).unwrap();
    let bytes = to_bytes(&weights(layout.num_params().unwrap()));

    let model = loader::load(&bytes, &doc).unwrap();
    assert_eq!(model.layers().len(), 3);
}

#[test]
fn test_ragged_blob_is_malformed() {
    let doc = serde_json::to_string(&letter_layout()).unwrap();

    let err = loader::load(&[0u8; 7], &doc).unwrap_err();
    assert!(matches!(err, MlErr::Malformed { .. }));
    assert!(!err.is_corrupt());
}

#[test]
fn test_missing_files_are_unreachable() {
    let dir = std::env::temp_dir().join("machine_learning-missing-model");
    let err = loader::load_files(&dir.join("weights.bin"), &dir.join("weights_info.json"))
        .unwrap_err();

    assert!(matches!(err, MlErr::Unreachable { .. }));
    assert!(!err.is_corrupt());
}

#[test]
fn test_overflowing_layout_is_a_load_error() {
    let doc = r#"{"layers":[{"name":"dense","kernel_shape":[4294967296,4294967296],"bias_shape":[4294967296]}]}"#;

    let err = loader::load(&[0u8; 8], doc).unwrap_err();
    assert!(matches!(err, MlErr::Malformed { .. }), "{err}");
    assert!(!err.is_corrupt());
}

#[test]
fn test_overflowing_total_is_a_load_error() {
    let half = usize::MAX / 2;
    let layout = LayerLayout {
        layers: vec![
            LayerSpec {
                name: "dense".into(),
                kernel_shape: [1, half],
                bias_shape: [half],
            },
            LayerSpec {
                name: "dense_1".into(),
                kernel_shape: [half, 1],
                bias_shape: [1],
            },
        ],
    };

    let err = loader::build(&layout, &[0.; 4]).unwrap_err();
    assert!(matches!(err, MlErr::Malformed { .. }), "{err}");
}
