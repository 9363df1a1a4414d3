use ndarray::{Array, Axis, Dimension};

use crate::WindowError;

/// Returns the length of `axis`, or an error if `dim` has no such axis.
pub fn axis_len<D: Dimension>(dim: &D, axis: Axis) -> Result<usize, WindowError> {
    let ndim = dim.ndim();
    if axis.index() >= ndim {
        return Err(WindowError::InvalidAxis {
            axis: axis.index(),
            ndim,
        });
    }
    Ok(dim[axis.index()])
}

/// Allocates an array shaped like `dim` with `axis` resized to `len`.
///
/// Memory is laid out as if `axis` had been moved to the end, so every lane
/// along `axis` is contiguous. The returned array is a permuted view of that
/// buffer and is only in standard layout when `axis` is the last one.
pub fn trailing_axis_array<D: Dimension>(dim: &D, axis: Axis, len: usize, fill: f64) -> Array<f64, D> {
    let ndim = dim.ndim();
    let axis = axis.index();

    let mut shape = D::zeros(ndim);
    let mut order = D::zeros(ndim);
    let mut j = 0;
    for i in 0..ndim {
        if i != axis {
            shape[j] = dim[i];
            j += 1;
        }

        // axis `i` of the result is axis `order[i]` of the buffer
        order[i] = match i.cmp(&axis) {
            std::cmp::Ordering::Less => i,
            std::cmp::Ordering::Equal => ndim - 1,
            std::cmp::Ordering::Greater => i - 1,
        };
    }
    shape[ndim - 1] = len;

    Array::from_elem(shape, fill).permuted_axes(order)
}
