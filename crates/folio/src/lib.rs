//! Driver for the folio page runtime: loads a page file, runs the portfolio
//! behaviours over it and reports the resulting document.

pub mod cli;
pub mod driver;
