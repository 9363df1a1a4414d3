use ndarray::{Array, ArrayBase, ArrayView1, ArrayViewMut1, Axis, Data, Dimension, Zip, s};

use crate::{
    WindowError,
    helpers::axis::{axis_len, trailing_axis_array},
};

/// Statistical moments the rolling engine can produce, lowest order first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Moment {
    Mean,
    StdDev,
    Skewness,
    Kurtosis,
}

impl Moment {
    pub const ALL: [Moment; 4] = [Self::Mean, Self::StdDev, Self::Skewness, Self::Kurtosis];

    /// Moments returned for a request, highest order first.
    pub fn chain(self, return_previous: bool) -> Vec<Moment> {
        if return_previous {
            Self::ALL.into_iter().rev().filter(|m| *m <= self).collect()
        } else {
            vec![self]
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::StdDev => "sd",
            Self::Skewness => "skewness",
            Self::Kurtosis => "kurtosis",
        }
    }
}

/// Window length and start-to-start skip, both in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlidingWindow {
    w_len: usize,
    skip: usize,
}

impl SlidingWindow {
    pub fn new(w_len: usize, skip: usize) -> Result<Self, WindowError> {
        if w_len == 0 || skip == 0 {
            return Err(WindowError::NonPositiveWindow { w_len, skip });
        }
        Ok(Self { w_len, skip })
    }

    pub fn w_len(&self) -> usize {
        self.w_len
    }

    pub fn skip(&self) -> usize {
        self.skip
    }

    /// `(n - w_len) / skip + 1`, or 0 when the window does not fit.
    pub fn window_count(&self, n: usize) -> usize {
        if n < self.w_len {
            0
        } else {
            (n - self.w_len) / self.skip + 1
        }
    }

    /// Window count for an axis of length `axis_len`, failing if the window is longer.
    pub fn fit(&self, axis_len: usize) -> Result<usize, WindowError> {
        if self.w_len > axis_len {
            return Err(WindowError::WindowTooLong {
                w_len: self.w_len,
                axis_len,
            });
        }
        Ok(self.window_count(axis_len))
    }

    fn overlaps(&self) -> bool {
        self.skip < self.w_len
    }
}

/// Count, mean and centered power sums of one window.
///
/// Samples are stored relative to `shift`, the first sample of the window the
/// sums were seeded from, so a large common offset does not eat into the
/// precision of the running mean.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct MomentSums {
    count: usize,
    shift: f64,
    mean: f64,
    m2: f64,
    m3: f64,
    m4: f64,
}

impl MomentSums {
    fn from_window<A: Copy + Into<f64>>(window: ArrayView1<A>) -> Self {
        let shift = window
            .first()
            .map(|&x| -> f64 { x.into() })
            .filter(|x| x.is_finite())
            .unwrap_or(0.0);
        let mut sums = Self {
            shift,
            ..Self::default()
        };
        for &x in window {
            sums.push(x.into());
        }
        sums
    }

    fn mean(&self) -> f64 {
        self.shift + self.mean
    }

    fn push(&mut self, x: f64) {
        let x = x - self.shift;
        let n1 = self.count as f64;
        self.count += 1;
        let n = self.count as f64;

        let delta = x - self.mean;
        let delta_n = delta / n;
        let delta_n2 = delta_n * delta_n;
        let term1 = delta * delta_n * n1;

        self.mean += delta_n;
        self.m4 += term1 * delta_n2 * (n * n - 3.0 * n + 3.0) + 6.0 * delta_n2 * self.m2
            - 4.0 * delta_n * self.m3;
        self.m3 += term1 * delta_n * (n - 2.0) - 3.0 * delta_n * self.m2;
        self.m2 += term1;
    }

    /// Exact inverse of [`Self::push`]. `x` must be in the window and `count >= 2`.
    fn pop(&mut self, x: f64) {
        let x = x - self.shift;
        let n = self.count as f64;
        let n1 = n - 1.0;

        let delta_n = (x - self.mean) / n1;
        let delta = delta_n * n;
        let delta_n2 = delta_n * delta_n;
        let term1 = delta * delta_n * n1;

        self.count -= 1;
        self.mean -= delta_n;
        self.m2 -= term1;
        self.m3 -= term1 * delta_n * (n - 2.0) - 3.0 * delta_n * self.m2;
        self.m4 -= term1 * delta_n2 * (n * n - 3.0 * n + 3.0) + 6.0 * delta_n2 * self.m2
            - 4.0 * delta_n * self.m3;
    }

    fn is_degenerate(&self) -> bool {
        self.m2 <= 0.0
    }

    /// Sample (n - 1) standard deviation, exactly 0 for a constant window.
    fn sd(&self) -> f64 {
        if self.is_degenerate() {
            0.0
        } else {
            (self.m2 / (self.count as f64 - 1.0)).sqrt()
        }
    }

    /// NaN for a constant window.
    fn skewness(&self) -> f64 {
        if self.is_degenerate() {
            f64::NAN
        } else {
            (self.count as f64).sqrt() * self.m3 / self.m2.powf(1.5)
        }
    }

    /// Excess kurtosis, NaN for a constant window.
    fn kurtosis(&self) -> f64 {
        if self.is_degenerate() {
            f64::NAN
        } else {
            self.count as f64 * self.m4 / (self.m2 * self.m2) - 3.0
        }
    }
}

/// Below this fraction of the largest M2 seen since the last full pass, the
/// running sums are recomputed from the window. Rounding residue in M4 scales
/// with the square of that peak.
const REFRESH_RATIO: f64 = 0.25;

/// Runs the window recurrence over one lane, handing each window's sums to `emit`.
///
/// The sums are seeded again from the window at least once every `w_len`
/// samples of advance, so rounding error never builds up over more than two
/// window lengths.
fn roll_lane<A, F>(x: ArrayView1<A>, window: SlidingWindow, n_windows: usize, mut emit: F)
where
    A: Copy + Into<f64>,
    F: FnMut(usize, &MomentSums),
{
    let SlidingWindow { w_len, skip } = window;
    let full_pass = |start: usize| MomentSums::from_window(x.slice(s![start..start + w_len]));

    let mut sums = full_pass(0);
    let mut peak_m2 = sums.m2.max(0.0);
    let mut advanced = 0;

    for i in 0..n_windows {
        let start = i * skip;

        if i > 0 {
            if window.overlaps() {
                for k in start - skip..start {
                    sums.pop(x[k].into());
                    sums.push(x[k + w_len].into());
                }
                advanced += skip;
                peak_m2 = peak_m2.max(sums.m2);

                // variance lost to cancellation, or a non-finite sample passed through
                let collapsed = peak_m2 > 0.0 && sums.m2 <= REFRESH_RATIO * peak_m2;
                if advanced >= w_len
                    || collapsed
                    || !sums.m2.is_finite()
                    || !sums.mean.is_finite()
                {
                    sums = full_pass(start);
                    peak_m2 = sums.m2.max(0.0);
                    advanced = 0;
                }
            } else {
                sums = full_pass(start);
            }
        }

        emit(i, &sums);
    }
}

/// Running-sum mean of one lane, reseeded like [`roll_lane`].
fn mean_lane<A>(
    x: ArrayView1<A>,
    window: SlidingWindow,
    n_windows: usize,
    mut out: ArrayViewMut1<f64>,
) where
    A: Copy + Into<f64>,
{
    let SlidingWindow { w_len, skip } = window;
    let full_sum = |start: usize| {
        x.slice(s![start..start + w_len])
            .iter()
            .map(|&v| -> f64 { v.into() })
            .sum::<f64>()
    };

    let mut sum = full_sum(0);
    let mut advanced = 0;

    for i in 0..n_windows {
        let start = i * skip;

        if i > 0 {
            advanced += skip;
            if window.overlaps() && advanced < w_len {
                for k in start - skip..start {
                    let (enter, leave): (f64, f64) = (x[k + w_len].into(), x[k].into());
                    sum += enter - leave;
                }
                if !sum.is_finite() {
                    sum = full_sum(start);
                }
            } else {
                sum = full_sum(start);
                advanced = 0;
            }
        }

        out[i] = sum / w_len as f64;
    }
}

/// All four moment arrays of one computation.
struct RollingMoments<D> {
    mean: Array<f64, D>,
    sd: Array<f64, D>,
    skewness: Array<f64, D>,
    kurtosis: Array<f64, D>,
}

impl<D: Dimension> RollingMoments<D> {
    fn compute<S, A>(a: &ArrayBase<S, D>, window: SlidingWindow, axis: Axis, n_windows: usize) -> Self
    where
        S: Data<Elem = A>,
        A: Copy + Into<f64> + Sync,
    {
        let dim = a.raw_dim();
        let mut moments = Self {
            mean: trailing_axis_array(&dim, axis, n_windows, f64::NAN),
            sd: trailing_axis_array(&dim, axis, n_windows, f64::NAN),
            skewness: trailing_axis_array(&dim, axis, n_windows, f64::NAN),
            kurtosis: trailing_axis_array(&dim, axis, n_windows, f64::NAN),
        };

        Zip::from(a.lanes(axis))
            .and(moments.mean.lanes_mut(axis))
            .and(moments.sd.lanes_mut(axis))
            .and(moments.skewness.lanes_mut(axis))
            .and(moments.kurtosis.lanes_mut(axis))
            .par_for_each(|x, mut mean, mut sd, mut skewness, mut kurtosis| {
                roll_lane(x, window, n_windows, |i, sums| {
                    mean[i] = sums.mean();
                    sd[i] = sums.sd();
                    skewness[i] = sums.skewness();
                    kurtosis[i] = sums.kurtosis();
                });
            });

        moments
    }

    fn select(self, moment: Moment, return_previous: bool) -> Vec<Array<f64, D>> {
        let mut slots = [
            Some(self.mean),
            Some(self.sd),
            Some(self.skewness),
            Some(self.kurtosis),
        ];
        moment
            .chain(return_previous)
            .into_iter()
            .filter_map(|m| slots[m as usize].take())
            .collect()
    }
}

fn validate<S, A, D>(
    a: &ArrayBase<S, D>,
    w_len: usize,
    skip: usize,
    axis: Axis,
) -> Result<(SlidingWindow, usize), WindowError>
where
    S: Data<Elem = A>,
    D: Dimension,
{
    let window = SlidingWindow::new(w_len, skip)?;
    let n_windows = window.fit(axis_len(&a.raw_dim(), axis)?)?;
    Ok((window, n_windows))
}

/// Rolling moments of `a` along `axis`.
///
/// Windows are `w_len` samples long and start every `skip` samples, giving
/// `(n - w_len) / skip + 1` values along `axis`; every other axis is kept as
/// is. With `return_previous` the lower-order moments are returned as well,
/// highest order first (kurtosis, skewness, sd, mean). Otherwise the vector
/// holds only the requested moment.
///
/// The result is laid out with `axis` innermost in memory, so it is only in
/// standard layout when `axis` is the last axis.
///
/// Constant windows have a standard deviation of exactly 0 and NaN skewness
/// and kurtosis.
pub fn rolling_moment<S, A, D>(
    a: &ArrayBase<S, D>,
    w_len: usize,
    skip: usize,
    axis: Axis,
    moment: Moment,
    return_previous: bool,
) -> Result<Vec<Array<f64, D>>, WindowError>
where
    S: Data<Elem = A>,
    A: Copy + Into<f64> + Sync,
    D: Dimension,
{
    if moment == Moment::Mean {
        return rolling_mean(a, w_len, skip, axis).map(|mean| vec![mean]);
    }

    let (window, n_windows) = validate(a, w_len, skip, axis)?;
    Ok(RollingMoments::compute(a, window, axis, n_windows).select(moment, return_previous))
}

pub fn rolling_mean<S, A, D>(
    a: &ArrayBase<S, D>,
    w_len: usize,
    skip: usize,
    axis: Axis,
) -> Result<Array<f64, D>, WindowError>
where
    S: Data<Elem = A>,
    A: Copy + Into<f64> + Sync,
    D: Dimension,
{
    let (window, n_windows) = validate(a, w_len, skip, axis)?;
    let mut mean = trailing_axis_array(&a.raw_dim(), axis, n_windows, f64::NAN);

    Zip::from(a.lanes(axis))
        .and(mean.lanes_mut(axis))
        .par_for_each(|x, mean| mean_lane(x, window, n_windows, mean));

    Ok(mean)
}

/// Rolling sample standard deviation, followed by the mean with `return_previous`.
pub fn rolling_sd<S, A, D>(
    a: &ArrayBase<S, D>,
    w_len: usize,
    skip: usize,
    axis: Axis,
    return_previous: bool,
) -> Result<Vec<Array<f64, D>>, WindowError>
where
    S: Data<Elem = A>,
    A: Copy + Into<f64> + Sync,
    D: Dimension,
{
    rolling_moment(a, w_len, skip, axis, Moment::StdDev, return_previous)
}

pub fn rolling_skewness<S, A, D>(
    a: &ArrayBase<S, D>,
    w_len: usize,
    skip: usize,
    axis: Axis,
    return_previous: bool,
) -> Result<Vec<Array<f64, D>>, WindowError>
where
    S: Data<Elem = A>,
    A: Copy + Into<f64> + Sync,
    D: Dimension,
{
    rolling_moment(a, w_len, skip, axis, Moment::Skewness, return_previous)
}

pub fn rolling_kurtosis<S, A, D>(
    a: &ArrayBase<S, D>,
    w_len: usize,
    skip: usize,
    axis: Axis,
    return_previous: bool,
) -> Result<Vec<Array<f64, D>>, WindowError>
where
    S: Data<Elem = A>,
    A: Copy + Into<f64> + Sync,
    D: Dimension,
{
    rolling_moment(a, w_len, skip, axis, Moment::Kurtosis, return_previous)
}
