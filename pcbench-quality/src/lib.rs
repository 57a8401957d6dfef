//! Pcbench Quality Crate
//!
//! Geometry and colour distortion between an original cloud and its decoded
//! reconstruction, and the CSV rendering of one benchmark row.

mod csv;
mod error;
mod metric;

pub use csv::CSV_COLUMNS;
pub use error::QualityError;
pub use metric::{PSNR_CAP_DB, QualityMetric, compute_quality_metric};
