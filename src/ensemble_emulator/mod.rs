//! Emulated ensemble source - generates plausible ensembles for testing
//!
//! Each call to [`EnsembleEmulator::next_ensemble`] produces one ensemble
//! with beam velocity, amplitude and correlation profiles, the Ensemble and
//! Ancillary records, and optionally Bottom Track and an NMEA GGA sentence.
//! Ensemble numbers increase by one and the sample time by one second.
//!
//! With a seed the output is fully deterministic, including timestamps.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::Deserialize;
use tracing::debug;

use crate::common::{CodecError, CodecResult, BAD_VELOCITY, MAX_BEAMS};
use crate::dataset::{BeamGrid, DataSetKind, NmeaData, Record};
use crate::ensemble::Ensemble;

/// Emulator configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Depth cells per profile
    pub num_bins: usize,
    /// Beams per profile (1-4)
    pub num_beams: usize,
    /// Depth cell size in metres
    pub bin_size: f32,
    /// RNG seed; `None` seeds from entropy and starts at the current time
    pub seed: Option<u64>,
    pub include_bottom_track: bool,
    pub include_nmea: bool,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            num_bins: 30,
            num_beams: 4,
            bin_size: 1.0,
            seed: None,
            include_bottom_track: true,
            include_nmea: false,
        }
    }
}

/// Standard deviations of the generated noise
mod noise {
    pub const VELOCITY: f32 = 0.05;
    pub const AMPLITUDE: f32 = 1.5;
    pub const CORRELATION: f32 = 0.02;
    pub const HEADING: f32 = 2.0;
    pub const TILT: f32 = 0.5;
    pub const RANGE: f32 = 0.1;
}

/// Bottom depth around which Bottom Track ranges are drawn
const BOTTOM_DEPTH_M: f32 = 20.0;

/// Roughly one velocity cell in this many is flagged bad
const BAD_CELL_RATIO: u32 = 200;

/// Emulated ensemble source
#[derive(Debug)]
pub struct EnsembleEmulator {
    config: EmulatorConfig,
    rng: StdRng,
    ensemble_number: i32,
    time: NaiveDateTime,
    unit: Normal<f32>,
}

impl EnsembleEmulator {
    /// Create an emulator; fails if the configuration is out of range
    pub fn new(config: EmulatorConfig) -> CodecResult<Self> {
        if !(1..=MAX_BEAMS).contains(&config.num_beams) {
            return Err(CodecError::config(format!(
                "num_beams must be 1-{}, got {}",
                MAX_BEAMS, config.num_beams
            )));
        }
        if !(config.bin_size.is_finite() && config.bin_size > 0.0) {
            return Err(CodecError::config(format!(
                "bin_size must be positive, got {}",
                config.bin_size
            )));
        }

        let (rng, time) = match config.seed {
            Some(seed) => (
                StdRng::seed_from_u64(seed),
                NaiveDate::from_ymd_opt(2020, 1, 1)
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .unwrap_or_default(),
            ),
            None => (StdRng::from_entropy(), Utc::now().naive_utc()),
        };
        let unit = Normal::new(0.0, 1.0).map_err(|e| CodecError::config(e.to_string()))?;

        debug!(
            num_bins = config.num_bins,
            num_beams = config.num_beams,
            seed = ?config.seed,
            "Ensemble emulator created"
        );

        Ok(Self {
            config,
            rng,
            ensemble_number: 1,
            time,
            unit,
        })
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// Number the next ensemble will carry
    pub fn ensemble_number(&self) -> i32 {
        self.ensemble_number
    }

    fn gauss(&mut self, mean: f32, sigma: f32) -> f32 {
        mean + sigma * self.unit.sample(&mut self.rng)
    }

    /// Generate the next ensemble
    pub fn next_ensemble(&mut self) -> CodecResult<Ensemble> {
        let number = self.ensemble_number;
        let mut ensemble = Ensemble::new(number)
            .with(self.velocity_profile()?)
            .with(self.amplitude_profile()?)
            .with(self.correlation_profile()?)
            .with(self.ensemble_record(number)?)
            .with(self.ancillary()?);
        if self.config.include_bottom_track {
            ensemble.add_data_set(self.bottom_track()?);
        }
        if self.config.include_nmea {
            ensemble.add_data_set(self.nmea()?);
        }

        self.ensemble_number = self.ensemble_number.wrapping_add(1);
        self.time += Duration::seconds(1);
        Ok(ensemble)
    }

    fn velocity_profile(&mut self) -> CodecResult<BeamGrid> {
        let (bins, beams) = (self.config.num_bins, self.config.num_beams);
        let mut cells = Vec::with_capacity(bins * beams);
        for _beam in 0..beams {
            for _bin in 0..bins {
                let v = if self.rng.gen_ratio(1, BAD_CELL_RATIO) {
                    BAD_VELOCITY
                } else {
                    self.gauss(0.0, noise::VELOCITY)
                };
                cells.push(v.into());
            }
        }
        BeamGrid::from_beam_major(DataSetKind::BeamVelocity, bins, beams, cells)
    }

    fn amplitude_profile(&mut self) -> CodecResult<BeamGrid> {
        let (bins, beams) = (self.config.num_bins, self.config.num_beams);
        let samples: Vec<f32> = (0..bins * beams)
            .map(|i| {
                let bin = i % bins.max(1);
                self.gauss(80.0 - 1.5 * bin as f32, noise::AMPLITUDE).max(0.0)
            })
            .collect();
        BeamGrid::from_beam_major(
            DataSetKind::Amplitude,
            bins,
            beams,
            samples.into_iter().map(Into::into).collect(),
        )
    }

    fn correlation_profile(&mut self) -> CodecResult<BeamGrid> {
        let (bins, beams) = (self.config.num_bins, self.config.num_beams);
        let samples: Vec<f32> = (0..bins * beams)
            .map(|i| {
                let bin = i % bins.max(1);
                self.gauss(0.95 - 0.01 * bin as f32, noise::CORRELATION)
                    .clamp(0.0, 1.0)
            })
            .collect();
        BeamGrid::from_beam_major(
            DataSetKind::Correlation,
            bins,
            beams,
            samples.into_iter().map(Into::into).collect(),
        )
    }

    fn ensemble_record(&self, number: i32) -> CodecResult<Record> {
        let t = self.time;
        Record::builder(DataSetKind::Ensemble)
            .scalar("EnsembleNumber", number)
            .scalar("NumBins", self.config.num_bins as i32)
            .scalar("NumBeams", self.config.num_beams as i32)
            .scalar("DesiredPingCount", 1)
            .scalar("ActualPingCount", 1)
            .scalar("Year", t.year())
            .scalar("Month", t.month() as i32)
            .scalar("Day", t.day() as i32)
            .scalar("Hour", t.hour() as i32)
            .scalar("Minute", t.minute() as i32)
            .scalar("Second", t.second() as i32)
            .scalar("HSec", (t.nanosecond() / 10_000_000) as i32)
            .build()
    }

    fn ancillary(&mut self) -> CodecResult<Record> {
        let bin_size = self.config.bin_size;
        let heading = self.gauss(90.0, noise::HEADING).rem_euclid(360.0);
        let pitch = self.gauss(0.0, noise::TILT);
        let roll = self.gauss(0.0, noise::TILT);
        let water_temp = self.gauss(15.0, 0.1);
        Record::builder(DataSetKind::Ancillary)
            .scalar("FirstBinRange", bin_size)
            .scalar("BinSize", bin_size)
            .scalar("Heading", heading)
            .scalar("Pitch", pitch)
            .scalar("Roll", roll)
            .scalar("WaterTemp", water_temp)
            .scalar("SystemTemp", 20.0f32)
            .scalar("Salinity", 35.0f32)
            .scalar("SpeedOfSound", 1500.0f32)
            .build()
    }

    fn bottom_track(&mut self) -> CodecResult<Record> {
        let beams = self.config.num_beams;
        let ranges: Vec<f32> = (0..beams)
            .map(|_| self.gauss(BOTTOM_DEPTH_M, noise::RANGE))
            .collect();
        let velocities: Vec<f32> = (0..beams)
            .map(|_| self.gauss(0.0, noise::VELOCITY))
            .collect();
        Record::builder(DataSetKind::BottomTrack)
            .beams(beams)
            .scalar("ActualPingCount", 1.0f32)
            .array("Range", ranges)
            .array("BeamVelocity", velocities)
            .array("BeamGood", vec![1.0f32; beams])
            .build()
    }

    fn nmea(&mut self) -> CodecResult<NmeaData> {
        let t = self.time;
        let lat_min = self.gauss(7.038, 0.001);
        let body = format!(
            "GPGGA,{:02}{:02}{:02}.{:02},48{:06.3},N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,",
            t.hour(),
            t.minute(),
            t.second(),
            t.nanosecond() / 10_000_000,
            lat_min
        );
        NmeaData::from_sentences([format!("${}*{:02X}", body, nmea_checksum(&body)).as_str()])
    }
}

impl Iterator for EnsembleEmulator {
    type Item = CodecResult<Ensemble>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_ensemble())
    }
}

/// XOR of the sentence body between `$` and `*`
pub fn nmea_checksum(body: &str) -> u8 {
    body.bytes().fold(0, |acc, b| acc ^ b)
}
