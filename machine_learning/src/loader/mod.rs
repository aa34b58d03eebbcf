//! Deserialization of a trained feed-forward network from a flat weight blob plus the
//! layout document describing its layers.
//!
//! The blob holds, for every layer in layout order, the kernel (row-major,
//! `[inputs, outputs]`) followed by the bias (`[outputs]`). Hidden layers use ReLU and the
//! last layer uses softmax. Dropout only exists at training time so it has no
//! counterpart here.

mod cursor;
mod layout;

use std::{fs, mem, path::Path};

pub use cursor::ParamCursor;
pub use layout::{LayerLayout, LayerSpec};

use crate::{
    MlErr, Result,
    arch::{Sequential, activations::ActFn, layers::Dense},
};

/// Reinterprets the raw blob bytes as `f32` values in native byte order.
///
/// # Errors
/// `MlErr::Malformed` if the byte length is not a whole number of floats.
pub fn decode_blob(bytes: &[u8]) -> Result<Vec<f32>> {
    const F32_SIZE: usize = mem::size_of::<f32>();

    if bytes.len() % F32_SIZE != 0 {
        return Err(MlErr::Malformed {
            what: "weight blob",
            detail: format!("{} bytes is not a multiple of {F32_SIZE}", bytes.len()),
        });
    }

    // The file buffer carries no alignment guarantee, so read each value unaligned.
    Ok(bytes
        .chunks_exact(F32_SIZE)
        .map(bytemuck::pod_read_unaligned::<f32>)
        .collect())
}

/// Builds the network described by `layout` out of `blob`.
///
/// # Arguments
/// * `layout` - The ordered layer shapes.
/// * `blob` - The flat parameters, consumed strictly in layer order.
///
/// # Returns
/// The model, or an error if the shapes disagree or the blob length does not match the
/// layout exactly.
pub fn build(layout: &LayerLayout, blob: &[f32]) -> Result<Sequential> {
    layout.validate()?;

    let mut cursor = ParamCursor::new(blob);
    let last = layout.layers.len() - 1;
    let mut layers = Vec::with_capacity(layout.layers.len());

    for (i, spec) in layout.layers.iter().enumerate() {
        let kernel = cursor.take(&spec.name, spec.kernel_size()?)?;
        let bias = cursor.take(&spec.name, spec.bias_shape[0])?;
        let act_fn = if i == last {
            ActFn::softmax()
        } else {
            ActFn::relu()
        };

        log::debug!(
            "layer {}: {}x{} {:?}",
            spec.name,
            spec.inputs(),
            spec.outputs(),
            act_fn
        );
        layers.push(Dense::new((spec.inputs(), spec.outputs()), kernel, bias, act_fn)?);
    }

    cursor.finish()?;
    Sequential::new(layers)
}

/// Loads a network from in-memory sources.
///
/// # Arguments
/// * `weights` - The raw weight blob bytes.
/// * `layout` - The layout JSON document.
pub fn load(weights: &[u8], layout: &str) -> Result<Sequential> {
    let layout = LayerLayout::from_json(layout)?;
    let blob = decode_blob(weights)?;
    build(&layout, &blob)
}

/// Loads a network from files on disk.
///
/// # Errors
/// `MlErr::Unreachable` if either file cannot be read, otherwise whatever `load` reports.
pub fn load_files(weights_path: &Path, layout_path: &Path) -> Result<Sequential> {
    let layout = fs::read_to_string(layout_path).map_err(|source| MlErr::Unreachable {
        what: "layer layout",
        source,
    })?;
    let weights = fs::read(weights_path).map_err(|source| MlErr::Unreachable {
        what: "weight blob",
        source,
    })?;

    let model = load(&weights, &layout)?;
    log::info!(
        "loaded {} layer model with {} parameters from {}",
        model.layers().len(),
        model.size(),
        weights_path.display()
    );
    Ok(model)
}
