//! Generic `TofSensor` trait and the frame type it produces.

use gaze_types::GazeError;

/// One zone of a ranging frame as reported by the sensor driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneReading {
    /// Measured distance in millimetres.  `0` means "no target".
    pub distance_mm: i32,
    /// Driver target status code (5, 6 and 9 are usable on the VL53L5CX).
    pub status: u8,
}

impl ZoneReading {
    pub fn new(distance_mm: i32, status: u8) -> Self {
        Self {
            distance_mm,
            status,
        }
    }
}

/// A square grid of zone readings, stored row-major (`index = y * width + x`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorFrame {
    width: usize,
    zones: Vec<ZoneReading>,
}

impl SensorFrame {
    /// Build a frame from row-major zones.
    ///
    /// # Errors
    ///
    /// Returns [`GazeError::InvalidGeometry`] when `zones.len() != width²`.
    pub fn new(width: usize, zones: Vec<ZoneReading>) -> Result<Self, GazeError> {
        if width == 0 || zones.len() != width * width {
            return Err(GazeError::InvalidGeometry {
                resolution: zones.len(),
            });
        }
        Ok(Self { width, zones })
    }

    /// A frame where every zone reads `distance_mm` with `status`.
    pub fn uniform(width: usize, distance_mm: i32, status: u8) -> Self {
        Self {
            width,
            zones: vec![ZoneReading::new(distance_mm, status); width * width],
        }
    }

    /// Replace zone `(x, y)`.  Out-of-grid coordinates are ignored.
    pub fn with_zone(mut self, x: usize, y: usize, distance_mm: i32, status: u8) -> Self {
        if x < self.width && y < self.width {
            self.zones[y * self.width + x] = ZoneReading::new(distance_mm, status);
        }
        self
    }

    /// Side length of the grid.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Total number of zones.
    pub fn resolution(&self) -> usize {
        self.zones.len()
    }

    /// Zones in row-major order.
    pub fn zones(&self) -> &[ZoneReading] {
        &self.zones
    }

    pub fn zone(&self, x: usize, y: usize) -> Option<&ZoneReading> {
        if x < self.width && y < self.width {
            self.zones.get(y * self.width + x)
        } else {
            None
        }
    }

    /// Sum of the raw distances of every zone, regardless of status.
    pub fn total_distance(&self) -> i64 {
        self.zones.iter().map(|z| i64::from(z.distance_mm)).sum()
    }
}

/// A multi-zone time-of-flight ranging sensor.
///
/// Only [`is_data_ready`][TofSensor::is_data_ready] is called from the hot
/// loop; it must never block.
pub trait TofSensor: Send {
    /// Stable identifier for this sensor, e.g. `"vl53l5cx"`.
    fn id(&self) -> &str;

    /// Probe and initialise the device.
    ///
    /// # Errors
    ///
    /// Returns [`GazeError::SensorNotFound`] when the device does not answer.
    fn begin(&mut self) -> Result<(), GazeError>;

    /// Request a zone count (16 or 64 on the VL53L5CX).
    fn set_resolution(&mut self, zones: usize) -> Result<(), GazeError>;

    /// Zone count currently configured on the device.
    fn resolution(&self) -> usize;

    /// Side length of the zone grid.
    fn grid_width(&self) -> usize {
        self.resolution().isqrt()
    }

    /// Start continuous ranging at `frequency_hz` frames per second.
    fn start_ranging(&mut self, frequency_hz: u8) -> Result<(), GazeError>;

    /// Non-blocking readiness poll.
    fn is_data_ready(&mut self) -> bool;

    /// Read the frame that [`is_data_ready`][TofSensor::is_data_ready]
    /// announced.
    ///
    /// # Errors
    ///
    /// Returns [`GazeError::SensorFault`] when the transfer fails.
    fn read_frame(&mut self) -> Result<SensorFrame, GazeError>;
}
