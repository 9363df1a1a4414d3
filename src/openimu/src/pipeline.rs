use std::{fs, path::Path};

use anyhow::{Context, bail};
use chrono::NaiveDateTime;
use ndarray::{Array1, Array2, ArrayView2, Axis, s};
use openimu_algos::{DayWindow, Moment, WindowError, day_windows, rolling_median, rolling_moment};
use openimu_types::{DayBoundary, Recording, Stream, WindowConfig};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentSettings {
    pub stream: Stream,
    pub w_len: usize,
    pub skip: usize,
    pub moment: Moment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowEntry {
    pub start: usize,
    pub stop: usize,
    pub window_start: Option<NaiveDateTime>,
    pub window_end: Option<NaiveDateTime>,
    pub partial: bool,
}

impl From<&DayWindow> for WindowEntry {
    fn from(window: &DayWindow) -> Self {
        Self {
            start: window.start,
            stop: window.stop,
            window_start: Some(window.window_start),
            window_end: Some(window.window_end),
            partial: window.partial,
        }
    }
}

impl WindowEntry {
    fn whole(n: usize) -> Self {
        Self {
            start: 0,
            stop: n,
            window_start: None,
            window_end: None,
            partial: false,
        }
    }

    fn len(&self) -> usize {
        self.stop - self.start
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowListing {
    pub boundary: DayBoundary,
    pub windows: Vec<WindowEntry>,
}

/// One moment over every rolling window of a day, one row per window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MomentColumn {
    pub moment: &'static str,
    pub values: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    #[serde(flatten)]
    pub boundary: Option<DayBoundary>,
    #[serde(flatten)]
    pub window: WindowEntry,
    pub moments: Vec<MomentColumn>,
}

pub fn read_recording(path: &Path) -> anyhow::Result<Recording> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Could not read `{}`", path.display()))?;
    let recording: Recording = serde_json::from_str(&text)
        .with_context(|| format!("`{}` is not a valid recording", path.display()))?;
    recording.validate()?;

    info!("Loaded {} samples from {}", recording.len(), path.display());
    Ok(recording)
}

/// Samples of `stream` as a `(samples, channels)` array.
///
/// Fails unless every stream of the recording has one entry per timestamp.
pub fn stream_array(recording: &Recording, stream: Stream) -> anyhow::Result<Array2<f64>> {
    recording.validate()?;
    if !recording.has_stream(stream) {
        bail!("Recording has no `{}` stream", stream.name());
    }

    let data = match stream {
        Stream::Accel => Array2::from(recording.accel.clone()),
        Stream::Gyro => Array2::from(recording.gyro.clone()),
        Stream::Temperature => Array1::from(recording.temperature.clone()).insert_axis(Axis(1)),
    };
    Ok(data)
}

fn rows(values: Array2<f64>) -> Vec<Vec<f64>> {
    values.outer_iter().map(|row| row.to_vec()).collect()
}

fn moment_columns(
    data: ArrayView2<f64>,
    settings: MomentSettings,
) -> Result<Vec<MomentColumn>, WindowError> {
    let moments = rolling_moment(
        &data,
        settings.w_len,
        settings.skip,
        Axis(0),
        settings.moment,
        true,
    )?;

    Ok(settings
        .moment
        .chain(true)
        .into_iter()
        .zip(moments)
        .map(|(moment, values)| MomentColumn {
            moment: moment.name(),
            values: rows(values),
        })
        .collect())
}

pub fn list_windows(
    recording: &Recording,
    config: &WindowConfig,
) -> anyhow::Result<Vec<WindowListing>> {
    config
        .boundaries()
        .iter()
        .map(|&boundary| -> anyhow::Result<WindowListing> {
            let windows = day_windows(&recording.time, boundary)?;
            Ok(WindowListing {
                boundary,
                windows: windows.iter().map(WindowEntry::from).collect(),
            })
        })
        .collect()
}

/// Rolling moments of every day window of the recording.
///
/// Without windowing the whole recording is summarized as one unit. Days
/// shorter than the moment window are skipped.
pub fn summarize(
    recording: &Recording,
    config: &WindowConfig,
    settings: MomentSettings,
) -> anyhow::Result<Vec<DaySummary>> {
    let data = stream_array(recording, settings.stream)?;

    let mut units = Vec::new();
    if config.is_windowed() {
        for listing in list_windows(recording, config)? {
            debug!(
                "{} windows for base {}h, period {}h",
                listing.windows.len(),
                listing.boundary.base_hour(),
                listing.boundary.period_hours()
            );
            units.extend(
                listing
                    .windows
                    .into_iter()
                    .map(|window| (Some(listing.boundary), window)),
            );
        }
    } else {
        info!("Windowing disabled, summarizing the whole recording");
        units.push((None, WindowEntry::whole(recording.len())));
    }

    let mut summaries = Vec::with_capacity(units.len());
    for (boundary, window) in units {
        if window.len() < settings.w_len {
            warn!(
                "Skipping samples {}..{}: shorter than the {} sample window",
                window.start, window.stop, settings.w_len
            );
            continue;
        }

        let day = data.slice(s![window.start..window.stop, ..]);
        let moments = moment_columns(day, settings)?;
        summaries.push(DaySummary {
            boundary,
            window,
            moments,
        });
    }

    Ok(summaries)
}

/// Rolling median of `stream`, one row per sample.
pub fn rolling_median_rows(
    recording: &Recording,
    stream: Stream,
    w_len: usize,
) -> anyhow::Result<Vec<Vec<f64>>> {
    let data = stream_array(recording, stream)?;
    Ok(rows(rolling_median(&data, w_len, Axis(0))?))
}
