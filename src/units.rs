//! # Unit Conversion
//!
//! The single seam between document units (millimetres) and device units
//! (pixels or printer dots). Every length the paint pipeline hands to a
//! surface goes through here; the layout engine never touches it.
//!
//! Horizontal and vertical resolution are independent. A device with
//! non-square pixels simply reports different `dpi_x` and `dpi_y`.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

pub const MM_PER_INCH: f64 = 25.4;
pub const POINTS_PER_INCH: f64 = 72.0;

/// What kind of device a surface draws to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceKind {
    /// Interactive preview.
    #[default]
    Screen,
    /// A genuine print output device.
    Printer,
    /// File export (PDF, image). Behaves like a screen for print suppression.
    Export,
}

/// Resolution and kind of the target device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetrics {
    pub dpi_x: f64,
    pub dpi_y: f64,
    #[serde(default)]
    pub kind: DeviceKind,
}

impl Default for DeviceMetrics {
    fn default() -> Self {
        Self::screen(96.0)
    }
}

impl DeviceMetrics {
    pub fn screen(dpi: f64) -> Self {
        Self {
            dpi_x: dpi,
            dpi_y: dpi,
            kind: DeviceKind::Screen,
        }
    }

    pub fn printer(dpi_x: f64, dpi_y: f64) -> Self {
        Self {
            dpi_x,
            dpi_y,
            kind: DeviceKind::Printer,
        }
    }

    pub fn is_native_printer(&self) -> bool {
        self.kind == DeviceKind::Printer
    }

    /// Device units per millimetre, horizontally.
    pub fn scale_x(&self) -> f64 {
        self.dpi_x / MM_PER_INCH
    }

    /// Device units per millimetre, vertically.
    pub fn scale_y(&self) -> f64 {
        self.dpi_y / MM_PER_INCH
    }
}

pub fn to_device_x(mm: f64, metrics: &DeviceMetrics) -> f64 {
    mm * metrics.scale_x()
}

pub fn to_device_y(mm: f64, metrics: &DeviceMetrics) -> f64 {
    mm * metrics.scale_y()
}

pub fn to_document_x(device: f64, metrics: &DeviceMetrics) -> f64 {
    device / metrics.scale_x()
}

pub fn to_document_y(device: f64, metrics: &DeviceMetrics) -> f64 {
    device / metrics.scale_y()
}

pub fn point_to_device(p: Point, metrics: &DeviceMetrics) -> Point {
    Point::new(to_device_x(p.x, metrics), to_device_y(p.y, metrics))
}

/// Convert a document-unit rectangle to device units.
pub fn to_device(rect: &Rect, metrics: &DeviceMetrics) -> Rect {
    Rect::new(
        to_device_x(rect.left, metrics),
        to_device_y(rect.top, metrics),
        to_device_x(rect.width, metrics),
        to_device_y(rect.height, metrics),
    )
}

/// Convert a device-unit rectangle back to document units.
pub fn to_document(rect: &Rect, metrics: &DeviceMetrics) -> Rect {
    Rect::new(
        to_document_x(rect.left, metrics),
        to_document_y(rect.top, metrics),
        to_document_x(rect.width, metrics),
        to_document_y(rect.height, metrics),
    )
}

/// Printer points (1/72 inch) to millimetres.
pub fn points_to_mm(points: f64) -> f64 {
    points * MM_PER_INCH / POINTS_PER_INCH
}

pub fn mm_to_points(mm: f64) -> f64 {
    mm * POINTS_PER_INCH / MM_PER_INCH
}
