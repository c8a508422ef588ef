use thiserror::Error;

pub mod deformer;
pub mod math;
pub mod puppet;
pub mod scene;

/// Structural and configuration failures surfaced while assembling a puppet.
///
/// A successfully assembled [`puppet::Puppet`] does not fail during
/// per-frame evaluation; everything here is detected once at setup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PuppetError {
    #[error("triangle {triangle} of part {part:?} is degenerate")]
    DegenerateTriangle { part: String, triangle: usize },

    #[error("part {part:?} referenced by the deformer tree has no geometry")]
    MissingGeometry { part: String },

    #[error("part {part:?} is attached to more than one deformer node")]
    DuplicatePart { part: String },

    #[error(
        "lattice is {rows} rows x {columns} columns, deformer needs \
         {expected_rows} x {expected_columns}"
    )]
    LatticeDimensionMismatch {
        expected_rows: usize,
        expected_columns: usize,
        rows: usize,
        columns: usize,
    },

    #[error("vertex index {index} of part {part:?} is out of range")]
    IndexOutOfRange { part: String, index: usize },

    #[error("index buffer of part {part:?} has length {len}, not a multiple of 3")]
    RaggedIndexBuffer { part: String, len: usize },

    #[error("geometry for part {part:?} was inserted twice")]
    DuplicateGeometry { part: String },
}
