//! Report artifact generation.
//!
//! The workbook writer and the chart renderer. The workbook is the
//! primary artifact and its failure fails the run; charts are rendered
//! best-effort on top of it.

pub mod charts;
pub mod workbook;

pub use charts::{render_charts, ChartSize, CHART_FILES};
pub use workbook::{write_workbook, SHEET_NAMES};
