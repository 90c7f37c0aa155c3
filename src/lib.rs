//! Inventory Scanner
//!
//! Reads a game's weapon and artifact inventory from screen captures. The
//! scanner walks the inventory grid, captures each item's detail card,
//! recognizes its fields with a pool of Tesseract engines and resolves the
//! text against reference catalogs.

pub mod automation;
pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod observer;
pub mod ocr;
pub mod paths;
pub mod resolve;
pub mod scan;

#[cfg(test)]
mod test_util;
