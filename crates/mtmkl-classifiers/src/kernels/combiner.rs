use ndarray::{Array2, ArrayView2};

use crate::error::{MtmklError, Result};
use crate::kernels::{KernelKind, KernelWeights};

/// Weighted sum of the Gram matrices of every kernel with positive weight.
///
/// Zero-weight kernels are never evaluated.
pub fn combine(
    weights: &KernelWeights,
    a: ArrayView2<f64>,
    b: ArrayView2<f64>,
) -> Result<Array2<f64>> {
    let mut combined = Array2::<f64>::zeros((a.nrows(), b.nrows()));
    for (kernel, weight) in weights.active() {
        let k = kernel.gram(a, b)?;
        combined.scaled_add(weight, &k);
    }
    Ok(combined)
}

/// Same blend as [`combine`], over Gram matrices that were already computed.
///
/// # Errors
///
/// [`MtmklError::InputShape`] if an active kernel has no Gram matrix in
/// `grams`, or if the matrices disagree in shape.
pub fn combine_grams(
    weights: &KernelWeights,
    grams: &[(KernelKind, Array2<f64>)],
) -> Result<Array2<f64>> {
    let shape = match grams.first() {
        Some((_, g)) => g.dim(),
        None => {
            return Err(MtmklError::InputShape(
                "no Gram matrices to combine".to_string(),
            ))
        }
    };

    let mut combined = Array2::<f64>::zeros(shape);
    for (kernel, weight) in weights.active() {
        let gram = grams
            .iter()
            .find(|(k, _)| *k == kernel)
            .map(|(_, g)| g)
            .ok_or_else(|| {
                MtmklError::InputShape(format!("missing Gram matrix for {} kernel", kernel))
            })?;
        if gram.dim() != shape {
            return Err(MtmklError::InputShape(format!(
                "{} Gram matrix has shape {:?}, expected {:?}",
                kernel,
                gram.dim(),
                shape
            )));
        }
        combined.scaled_add(weight, gram);
    }
    Ok(combined)
}
