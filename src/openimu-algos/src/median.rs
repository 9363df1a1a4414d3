use ndarray::{Array, ArrayBase, ArrayView1, ArrayViewMut1, Axis, Data, Dimension, Zip};

use crate::{
    WindowError,
    helpers::axis::{axis_len, trailing_axis_array},
    moments::SlidingWindow,
};

/// Sorted contents of a moving window.
struct SortedWindow {
    values: Vec<f64>,
}

impl SortedWindow {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    fn insert(&mut self, value: f64) {
        let at = self
            .values
            .partition_point(|v| v.total_cmp(&value).is_lt());
        self.values.insert(at, value);
    }

    fn remove(&mut self, value: f64) {
        if let Ok(at) = self.values.binary_search_by(|v| v.total_cmp(&value)) {
            self.values.remove(at);
        }
    }

    /// Middle value; the window always holds an odd number of samples.
    fn median(&self) -> f64 {
        self.values[self.values.len() / 2]
    }
}

/// Moving median of one lane, samples outside the lane read as zero.
fn median_lane<A>(x: ArrayView1<A>, w_len: usize, mut out: ArrayViewMut1<f64>)
where
    A: Copy + Into<f64>,
{
    let n = x.len() as isize;
    let half = (w_len / 2) as isize;
    let value = |i: isize| {
        if (0..n).contains(&i) {
            x[i as usize].into()
        } else {
            0.0
        }
    };

    let mut window = SortedWindow::with_capacity(2 * half as usize + 1);
    for i in -half..=half {
        window.insert(value(i));
    }

    for i in 0..n {
        if i > 0 {
            window.remove(value(i - half - 1));
            window.insert(value(i + half));
        }
        out[i as usize] = window.median();
    }
}

/// Rolling median of `a` along `axis`, one value per sample.
///
/// The window is centered on the current sample with `w_len / 2` samples on
/// each side, so an even `w_len` is widened to `w_len + 1`. Samples beyond
/// either end of the axis count as zeros.
pub fn rolling_median<S, A, D>(
    a: &ArrayBase<S, D>,
    w_len: usize,
    axis: Axis,
) -> Result<Array<f64, D>, WindowError>
where
    S: Data<Elem = A>,
    A: Copy + Into<f64> + Sync,
    D: Dimension,
{
    let window = SlidingWindow::new(w_len, 1)?;
    let dim = a.raw_dim();
    let n = axis_len(&dim, axis)?;

    let mut median = trailing_axis_array(&dim, axis, n, f64::NAN);
    Zip::from(a.lanes(axis))
        .and(median.lanes_mut(axis))
        .par_for_each(|x, out| median_lane(x, window.w_len(), out));

    Ok(median)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2, array};

    #[test]
    fn odd_window_pads_with_zeros() {
        let x = array![1.0, 5.0, 2.0, 8.0, 3.0];
        let med = rolling_median(&x, 3, Axis(0)).unwrap();
        assert_eq!(med, array![1.0, 2.0, 5.0, 3.0, 3.0]);
    }

    #[test]
    fn even_window_is_widened_to_odd() {
        let x = array![1.0, 5.0, 2.0, 8.0, 3.0];
        // windows: [0,0,1,5,2] [0,1,5,2,8] [1,5,2,8,3] [5,2,8,3,0] [2,8,3,0,0]
        let med = rolling_median(&x, 4, Axis(0)).unwrap();
        assert_eq!(med, array![1.0, 2.0, 3.0, 3.0, 2.0]);
        assert_eq!(med, rolling_median(&x, 5, Axis(0)).unwrap());
    }

    #[test]
    fn two_sample_window_spans_neighbours() {
        let x = array![4.0, 1.0, 9.0, 7.0];
        // windows: [0,4,1] [4,1,9] [1,9,7] [9,7,0]
        let med = rolling_median(&x, 2, Axis(0)).unwrap();
        assert_eq!(med, array![1.0, 4.0, 7.0, 7.0]);
    }

    #[test]
    fn unit_window_is_identity() {
        let x = Array1::from_iter((0..6).map(|i| i as f32 * 1.5));
        let med = rolling_median(&x, 1, Axis(0)).unwrap();
        assert_eq!(med, x.mapv(f64::from));
    }

    #[test]
    fn window_longer_than_signal() {
        let x = array![4.0, 4.0];
        let med = rolling_median(&x, 5, Axis(0)).unwrap();
        // windows: [0,0,4,4,0] [0,4,4,0,0]
        assert_eq!(med, array![0.0, 0.0]);
    }

    #[test]
    fn lanes_are_independent() {
        let x = Array2::from_shape_vec((5, 2), vec![1.0, 10.0, 5.0, 50.0, 2.0, 20.0, 8.0, 80.0, 3.0, 30.0])
            .unwrap();
        let med = rolling_median(&x, 3, Axis(0)).unwrap();
        assert_eq!(med.column(0), array![1.0, 2.0, 5.0, 3.0, 3.0]);
        assert_eq!(med.column(1), array![10.0, 20.0, 50.0, 30.0, 30.0]);
        assert!(!med.is_standard_layout());
    }

    #[test]
    fn invalid_parameters() {
        let x = array![1.0, 2.0];
        assert_eq!(
            rolling_median(&x, 0, Axis(0)),
            Err(WindowError::NonPositiveWindow { w_len: 0, skip: 1 })
        );
        assert_eq!(
            rolling_median(&x, 1, Axis(1)),
            Err(WindowError::InvalidAxis { axis: 1, ndim: 1 })
        );
    }
}
