//! Post-processing of free-form model output
//!
//! - `structured`: JSON decoding that tolerates fences and chatter
//! - `figures`: currency and percentage extraction
//! - `report`: category/field tables built from parsed JSON

pub mod figures;
pub mod report;
pub mod structured;

pub use figures::{extract_amounts, extract_figures, parse_amount, Figure, FigureKind};
pub use report::{FieldValue, FinancialReport};
