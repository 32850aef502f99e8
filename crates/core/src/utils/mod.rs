//! Utility helpers shared across modules.

pub mod csv_utils;
pub mod decimal_utils;
