use serde::{Deserialize, Serialize};

use crate::InputError;

/// Decoded wearable recording, one entry per sample in every stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Seconds since the Unix epoch, wall clock.
    pub time: Vec<f64>,
    /// Acceleration in g, `[x, y, z]`.
    pub accel: Vec<[f64; 3]>,
    /// Angular velocity in deg/s, `[x, y, z]`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gyro: Vec<[f64; 3]>,
    /// Temperature in degC.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub temperature: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    #[default]
    Accel,
    Gyro,
    Temperature,
}

impl Stream {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Accel => "accel",
            Self::Gyro => "gyro",
            Self::Temperature => "temperature",
        }
    }

    pub fn channels(&self) -> usize {
        match self {
            Self::Accel | Self::Gyro => 3,
            Self::Temperature => 1,
        }
    }
}

impl Recording {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn has_stream(&self, stream: Stream) -> bool {
        match stream {
            Stream::Accel => !self.accel.is_empty(),
            Stream::Gyro => !self.gyro.is_empty(),
            Stream::Temperature => !self.temperature.is_empty(),
        }
    }

    /// Checks that every present stream has one entry per timestamp.
    /// Acceleration is mandatory, the other streams may be left out.
    pub fn validate(&self) -> Result<(), InputError> {
        let expected = self.time.len();
        let lengths = [
            (Stream::Accel, self.accel.len(), true),
            (Stream::Gyro, self.gyro.len(), false),
            (Stream::Temperature, self.temperature.len(), false),
        ];

        for (stream, found, required) in lengths {
            if found == 0 && !required {
                continue;
            }
            if found != expected {
                return Err(InputError::StreamLength {
                    stream: stream.name(),
                    expected,
                    found,
                });
            }
        }

        Ok(())
    }
}
