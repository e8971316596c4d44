//! Environmental telemetry

use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One weather observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub timestamp: DateTime<Utc>,
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity, 0-100
    pub humidity: f64,
    /// Millimetres
    pub rainfall: f64,
    /// km/h
    #[serde(alias = "windSpeed")]
    pub wind_speed: f64,
    /// Kilometres
    pub visibility: f64,
}

impl WeatherSample {
    pub fn validate(&self) -> Result<()> {
        let at = self.timestamp;
        if !self.temperature.is_finite() {
            return Err(EngineError::quantity(format!("weather {at}: temperature is not a number")));
        }
        if !(0.0..=100.0).contains(&self.humidity) {
            return Err(EngineError::quantity(format!(
                "weather {at}: humidity must be within 0-100, got {}",
                self.humidity
            )));
        }
        for (field, value) in [
            ("rainfall", self.rainfall),
            ("wind_speed", self.wind_speed),
            ("visibility", self.visibility),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::quantity(format!(
                    "weather {at}: {field} must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Validated samples ordered by timestamp ascending
///
/// (De)serializes as a plain sample array; deserialization validates and sorts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<WeatherSample>", into = "Vec<WeatherSample>")]
pub struct WeatherSeries {
    samples: Vec<WeatherSample>,
}

impl WeatherSeries {
    pub fn from_samples(mut samples: Vec<WeatherSample>) -> Result<Self> {
        for sample in &samples {
            sample.validate()?;
        }
        samples.sort_by_key(|s| s.timestamp);
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[WeatherSample] {
        &self.samples
    }

    pub fn latest(&self) -> Option<&WeatherSample> {
        self.samples.last()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Summary statistics, `None` for an empty series
    pub fn summary(&self) -> Option<WeatherSummary> {
        let latest = *self.latest()?;
        let count = self.samples.len() as f64;

        let mut summary = WeatherSummary {
            latest,
            min_temperature: f64::INFINITY,
            max_temperature: f64::NEG_INFINITY,
            total_rainfall: 0.0,
            peak_wind_speed: 0.0,
            min_visibility: f64::INFINITY,
            mean_humidity: 0.0,
        };
        for sample in &self.samples {
            summary.min_temperature = summary.min_temperature.min(sample.temperature);
            summary.max_temperature = summary.max_temperature.max(sample.temperature);
            summary.total_rainfall += sample.rainfall;
            summary.peak_wind_speed = summary.peak_wind_speed.max(sample.wind_speed);
            summary.min_visibility = summary.min_visibility.min(sample.visibility);
            summary.mean_humidity += sample.humidity / count;
        }
        Some(summary)
    }
}

impl TryFrom<Vec<WeatherSample>> for WeatherSeries {
    type Error = EngineError;

    fn try_from(samples: Vec<WeatherSample>) -> Result<Self> {
        Self::from_samples(samples)
    }
}

impl From<WeatherSeries> for Vec<WeatherSample> {
    fn from(series: WeatherSeries) -> Self {
        series.samples
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub latest: WeatherSample,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub total_rainfall: f64,
    pub peak_wind_speed: f64,
    pub min_visibility: f64,
    pub mean_humidity: f64,
}
