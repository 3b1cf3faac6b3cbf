//! Consist loading: reads a data file, validates it, builds a train.
//!
//! Provides format detection (RON/JSON/TOML), deserialization helpers, and
//! the resolution of [`TrainData`] into a ready-to-run [`Train`].

use std::path::{Path, PathBuf};

use airbrake_core::apparatus::{AirSounds, CarBrake};
use airbrake_core::audio::{CarSound, Vector3};
use airbrake_core::car::{Car, MotorUnit};
use airbrake_core::compressor::AirCompressor;
use airbrake_core::handle::{Handle, HandleSet};
use airbrake_core::id::SoundBufferId;
use airbrake_core::pressure::{BrakeCylinder, BrakePipe};
use airbrake_core::train::{Train, TrainError};
use log::{info, warn};
use serde::de::DeserializeOwned;

use crate::schema::{CarData, HandleData, SoundData, TrainData};

/// Upper bound on the number of cars in one consist, after `count`
/// expansion.
pub const MAX_CARS: usize = 4096;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A value violates a precondition of the brake model.
    #[error("invalid {field}: {detail}")]
    Invalid { field: String, detail: String },

    /// The consist could not be assembled into a train.
    #[error(transparent)]
    Train(#[from] TrainError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Deserialize `content` in the given format. `file` is only used for error
/// reporting.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    file: &Path,
) -> Result<T, DataLoadError> {
    let parse_error = |detail: String| DataLoadError::Parse {
        file: file.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

// ===========================================================================
// Entry points
// ===========================================================================

/// Load a consist file and build the train it describes.
pub fn load_train(path: &Path) -> Result<Train, DataLoadError> {
    let data: TrainData = deserialize_file(path)?;
    let train = build_train(&data)?;
    info!(
        "loaded consist of {} cars from {}",
        train.car_count(),
        path.display()
    );
    Ok(train)
}

/// Build a train from an in-memory consist description.
pub fn train_from_str(content: &str, format: Format) -> Result<Train, DataLoadError> {
    let data: TrainData = deserialize_str(content, format, Path::new("<inline>"))?;
    build_train(&data)
}

/// Validate `data` and resolve it into a train. Cars with a `count` are
/// repeated in place.
pub fn build_train(data: &TrainData) -> Result<Train, DataLoadError> {
    let brake = build_handle(&data.handles.brake, "handles.brake", false)?;
    let mut handles = HandleSet::new(brake);
    if let Some(loco) = &data.handles.loco_brake {
        handles = handles.with_loco_brake(build_handle(loco, "handles.loco_brake", true)?);
    }

    let mut total = 0usize;
    for (index, car_data) in data.cars.iter().enumerate() {
        if car_data.count == 0 {
            return Err(invalid(format!("cars[{index}].count"), "must be at least 1"));
        }
        total = total.saturating_add(car_data.count);
        if total > MAX_CARS {
            return Err(invalid(
                format!("cars[{index}].count"),
                format!("consist exceeds {MAX_CARS} cars"),
            ));
        }
        validate_car(car_data, index)?;
    }

    let mut cars = Vec::with_capacity(total);
    for (index, car_data) in data.cars.iter().enumerate() {
        for _ in 0..car_data.count {
            cars.push(build_car(car_data, index));
        }
    }

    Ok(Train::new(
        cars,
        data.driver_car,
        handles,
        data.loco_brake_mode,
    )?)
}

// ===========================================================================
// Resolution
// ===========================================================================

fn build_handle(data: &HandleData, field: &str, loco: bool) -> Result<Handle, DataLoadError> {
    if data.kind.is_loco() != loco {
        let expected = if loco { "a loco" } else { "a train" };
        return Err(invalid(
            format!("{field}.kind"),
            format!("{:?} is not {expected} brake handle kind", data.kind),
        ));
    }
    if data.kind.is_continuous() {
        return Ok(Handle::new(data.kind, 1));
    }
    match data.maximum_notch {
        Some(0) => Err(invalid(format!("{field}.maximum_notch"), "must be positive")),
        Some(max) => Ok(Handle::new(data.kind, max)),
        None => Err(invalid(
            format!("{field}.maximum_notch"),
            "required for notched handles",
        )),
    }
}

fn validate_car(data: &CarData, index: usize) -> Result<(), DataLoadError> {
    let field = |name: &str| format!("cars[{index}].{name}");

    let pipe = &data.brake_pipe;
    non_negative(&field("brake_pipe.normal_pressure"), pipe.normal_pressure)?;
    non_negative(&field("brake_pipe.leak_rate"), pipe.leak_rate)?;
    non_negative(&field("brake_pipe.charge_rate"), pipe.charge_rate)?;
    non_negative(&field("brake_pipe.exhaust_rate"), pipe.exhaust_rate)?;

    let cylinder = &data.brake_cylinder;
    if !(cylinder.service_maximum_pressure > 0.0 && cylinder.service_maximum_pressure.is_finite()) {
        return Err(invalid(
            field("brake_cylinder.service_maximum_pressure"),
            "must be positive",
        ));
    }
    non_negative(
        &field("brake_cylinder.emergency_maximum_pressure"),
        cylinder.emergency_maximum_pressure,
    )?;
    non_negative(&field("brake_cylinder.apply_rate"), cylinder.apply_rate)?;
    non_negative(&field("brake_cylinder.release_rate"), cylinder.release_rate)?;
    non_negative(&field("brake_cylinder.emergency_rate"), cylinder.emergency_rate)?;

    let compressor = &data.compressor;
    non_negative(&field("compressor.minimum_pressure"), compressor.minimum_pressure)?;
    non_negative(&field("compressor.rate"), compressor.rate)?;
    non_negative(&field("compressor.leak_rate"), compressor.leak_rate)?;
    if compressor.maximum_pressure < compressor.minimum_pressure {
        return Err(invalid(
            field("compressor.maximum_pressure"),
            "must not be below minimum_pressure",
        ));
    }
    if pipe.normal_pressure > compressor.maximum_pressure {
        warn!(
            "cars[{index}]: brake pipe normal pressure {} exceeds main reservoir maximum {}; the pipe cannot fully recharge",
            pipe.normal_pressure, compressor.maximum_pressure
        );
    }

    non_negative(&field("brake_control_speed"), data.brake_control_speed)?;
    non_negative(
        &field("deceleration_at_service_maximum"),
        data.deceleration_at_service_maximum,
    )?;
    if let Some(motor) = data.motor_deceleration {
        non_negative(&field("motor_deceleration"), motor)?;
    }
    Ok(())
}

fn build_car(data: &CarData, index: usize) -> Car {
    let pipe = &data.brake_pipe;
    let brake_pipe = BrakePipe::new(pipe.normal_pressure, pipe.leak_rate)
        .with_rates(pipe.charge_rate, pipe.exhaust_rate);

    let cyl = &data.brake_cylinder;
    let mut emergency = cyl.emergency_maximum_pressure;
    if emergency < cyl.service_maximum_pressure {
        warn!(
            "cars[{index}]: emergency maximum {emergency} below service maximum {}; raised to match",
            cyl.service_maximum_pressure
        );
        emergency = cyl.service_maximum_pressure;
    }
    let brake_cylinder = BrakeCylinder::new(cyl.service_maximum_pressure, emergency).with_rates(
        cyl.apply_rate,
        cyl.release_rate,
        cyl.emergency_rate,
    );

    let comp = &data.compressor;
    let compressor = AirCompressor::new(comp.minimum_pressure, comp.maximum_pressure, comp.rate)
        .with_leak_rate(comp.leak_rate);

    let sounds = &data.sounds;
    let brake = CarBrake::new(data.brake_type, data.system, brake_pipe, brake_cylinder)
        .with_compressor(compressor)
        .with_brake_control_speed(data.brake_control_speed)
        .with_deceleration(data.deceleration_at_service_maximum)
        .with_air_sounds(AirSounds {
            zero: car_sound(sounds.air_zero.as_ref()),
            normal: car_sound(sounds.air_normal.as_ref()),
            high: car_sound(sounds.air_high.as_ref()),
        })
        .with_rub_sound(car_sound(sounds.rub.as_ref()));

    match data.motor_deceleration {
        Some(motor) => Car::powered(brake, MotorUnit::new(motor)),
        None => Car::trailer(brake),
    }
}

fn car_sound(data: Option<&SoundData>) -> CarSound {
    match data {
        Some(sound) => {
            let [x, y, z] = sound.position;
            CarSound::new(SoundBufferId(sound.buffer), Vector3::new(x, y, z))
        }
        None => CarSound::default(),
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), DataLoadError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field.to_string(), format!("{value} must be a finite non-negative number")))
    }
}

fn invalid(field: String, detail: impl Into<String>) -> DataLoadError {
    DataLoadError::Invalid {
        field,
        detail: detail.into(),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
