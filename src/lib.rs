#![warn(rust_2018_idioms)]

//! A copy-on-build object model for the tables of SFNT (TrueType and OpenType) fonts.
//!
//! Tables read from a font are immutable views over shared bytes. Editing goes through a
//! builder, which decodes the table into a model on first access and serializes the model
//! into new bytes when built. Builders for tables that contain subtables propagate edits of
//! their children so the container knows to re-serialize.

#[macro_use]
pub mod tag;

/// Reading and writing of binary data.
pub mod binary;
/// Checksum calculation routines.
pub mod checksum;
pub mod error;
pub mod font;
pub mod font_data;
pub mod font_data_table;
pub mod header;
pub mod size;
pub mod subtable;
#[macro_use]
pub mod table;
pub mod tables;
/// Shared test code.
#[cfg(test)]
pub mod tests;
