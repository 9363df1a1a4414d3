use serde::Serialize;

use crate::InputError;

/// Recurring cut point that splits a recording into "days".
///
/// Windows start at `base_hour` and advance by `period_hours`. A period of
/// 24 gives one window per calendar day anchored at the base hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DayBoundary {
    base_hour: u32,
    period_hours: u32,
}

impl DayBoundary {
    pub const HOURS_PER_DAY: u32 = 24;
    const SECONDS_PER_HOUR: i64 = 3600;

    pub fn new(base_hour: u32, period_hours: u32) -> Result<Self, InputError> {
        if base_hour >= Self::HOURS_PER_DAY {
            return Err(InputError::InvalidBaseHour(base_hour));
        }
        if period_hours == 0 || period_hours > Self::HOURS_PER_DAY {
            return Err(InputError::InvalidPeriod(period_hours));
        }

        Ok(Self {
            base_hour,
            period_hours,
        })
    }

    pub fn base_hour(&self) -> u32 {
        self.base_hour
    }

    pub fn period_hours(&self) -> u32 {
        self.period_hours
    }

    pub fn period_seconds(&self) -> i64 {
        i64::from(self.period_hours) * Self::SECONDS_PER_HOUR
    }

    /// Hour of day at which the window following the base window starts.
    pub fn end_hour(&self) -> u32 {
        (self.base_hour + self.period_hours) % Self::HOURS_PER_DAY
    }

    pub fn is_full_day(&self) -> bool {
        self.period_hours == Self::HOURS_PER_DAY
    }
}

/// Windowing parameters as handed to a reader.
///
/// Bases and periods come in pairs. Giving only one of the two is not an
/// error, but windowing is switched off and a warning is logged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowConfig {
    boundaries: Vec<DayBoundary>,
}

impl WindowConfig {
    pub fn new(bases: Option<&[u32]>, periods: Option<&[u32]>) -> Result<Self, InputError> {
        match (bases, periods) {
            (Some(bases), Some(periods)) => {
                if bases.len() != periods.len() {
                    return Err(InputError::MismatchedPairs {
                        bases: bases.len(),
                        periods: periods.len(),
                    });
                }

                let boundaries = bases
                    .iter()
                    .zip(periods)
                    .map(|(&base, &period)| DayBoundary::new(base, period))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(Self { boundaries })
            }
            (None, None) => Ok(Self::default()),
            _ => {
                warn!(
                    "base and period must both be given for windowing, windowing will not be performed"
                );
                Ok(Self::default())
            }
        }
    }

    pub fn single(boundary: DayBoundary) -> Self {
        Self {
            boundaries: vec![boundary],
        }
    }

    pub fn is_windowed(&self) -> bool {
        !self.boundaries.is_empty()
    }

    pub fn boundaries(&self) -> &[DayBoundary] {
        &self.boundaries
    }
}
