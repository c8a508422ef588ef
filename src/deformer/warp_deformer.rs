use glam::{dvec2, DVec2};

use crate::math::lerp;
use crate::PuppetError;

/// A regular grid of 2D displacement vectors over a warp region, one
/// vector per lattice point, `(ctrl_div_y + 1)` rows of
/// `(ctrl_div_x + 1)` columns in row-major order.
///
/// Displacements are in cell units: a displacement of `(1, 0)` moves a
/// lattice point one full cell to the right at `|phase| == 1`.
#[derive(Debug, Clone)]
pub struct Lattice {
    columns: usize,
    points: Vec<DVec2>,
}

impl Lattice {
    fn from_rows(
        rows: Vec<Vec<DVec2>>,
        ctrl_div_x: usize,
        ctrl_div_y: usize,
    ) -> Result<Lattice, PuppetError> {
        let expected_rows = ctrl_div_y + 1;
        let expected_columns = ctrl_div_x + 1;
        let columns = rows.first().map(Vec::len).unwrap_or(0);
        if rows.len() != expected_rows || rows.iter().any(|r| r.len() != expected_columns) {
            return Err(PuppetError::LatticeDimensionMismatch {
                expected_rows,
                expected_columns,
                rows: rows.len(),
                columns,
            });
        }
        Ok(Lattice {
            columns: expected_columns,
            points: rows.into_iter().flatten().collect(),
        })
    }

    /// Displacement at lattice point `(row, col)`; indices past the grid
    /// edge clamp to the edge point, so boundary cells read their own
    /// corner twice.
    fn displacement(&self, row: usize, col: usize) -> DVec2 {
        let rows = self.points.len() / self.columns;
        let row = row.min(rows - 1);
        let col = col.min(self.columns - 1);
        self.points[row * self.columns + col]
    }
}

/// Warp deformer: remaps points inside a rectangular region through a
/// piecewise-bilinear displacement lattice.
///
/// Carries one lattice per phase extreme; `phase < 0` selects the first,
/// `phase >= 0` the second. Without lattices the warp is the identity.
#[derive(Debug, Clone)]
pub struct WarpDeformer {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub ctrl_div_x: usize,
    pub ctrl_div_y: usize,
    lattices: Option<[Lattice; 2]>,
}

fn clamped_cell(value: f64, lower: f64, upper: f64, divisions: usize) -> usize {
    let raw = (divisions as f64 * (value - lower) / (upper - lower)).floor();
    raw.clamp(0.0, divisions as f64) as usize
}

fn fract_in_cell(offset: f64, cell: f64) -> f64 {
    // Double mod guards offsets left of the region.
    (((offset % cell) + cell) % cell) / cell
}

impl WarpDeformer {
    pub fn new(
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        ctrl_div_x: usize,
        ctrl_div_y: usize,
    ) -> WarpDeformer {
        debug_assert!(x1 < x2 && y1 < y2);
        debug_assert!(ctrl_div_x >= 1 && ctrl_div_y >= 1);
        WarpDeformer {
            x1,
            y1,
            x2,
            y2,
            ctrl_div_x,
            ctrl_div_y,
            lattices: None,
        }
    }

    /// Attaches the two extreme displacement lattices, each authored as
    /// rows of per-point displacements. Row and column counts must match
    /// the control divisions plus one.
    pub fn with_lattices(
        mut self,
        negative: Vec<Vec<DVec2>>,
        positive: Vec<Vec<DVec2>>,
    ) -> Result<WarpDeformer, PuppetError> {
        let negative = Lattice::from_rows(negative, self.ctrl_div_x, self.ctrl_div_y)?;
        let positive = Lattice::from_rows(positive, self.ctrl_div_x, self.ctrl_div_y)?;
        self.lattices = Some([negative, positive]);
        Ok(self)
    }

    pub fn is_animated(&self) -> bool {
        self.lattices.is_some()
    }

    /// Warped destination of `point` at `phase` in `[-1, 1]`, in the same
    /// space as the region bounds.
    ///
    /// The X output blends two X-direction spans across Y; the Y output
    /// blends two Y-direction spans across X. The asymmetry is part of
    /// the deformer's definition, not an artifact.
    pub fn warp(&self, point: DVec2, phase: f64) -> DVec2 {
        let cell_w = (self.x2 - self.x1) / self.ctrl_div_x as f64;
        let cell_h = (self.y2 - self.y1) / self.ctrl_div_y as f64;

        let div_x = clamped_cell(point.x, self.x1, self.x2, self.ctrl_div_x);
        let div_y = clamped_cell(point.y, self.y1, self.y2, self.ctrl_div_y);
        let ipl_x = fract_in_cell(point.x - self.x1, cell_w);
        let ipl_y = fract_in_cell(point.y - self.y1, cell_h);

        let lattice = self
            .lattices
            .as_ref()
            .map(|pair| if phase < 0.0 { &pair[0] } else { &pair[1] });
        let corner = |row_off: usize, col_off: usize| match lattice {
            Some(l) => l.displacement(div_y + row_off, div_x + col_off),
            None => DVec2::ZERO,
        };
        // Rows follow Y, columns follow X.
        let c00 = corner(0, 0);
        let c01 = corner(0, 1);
        let c10 = corner(1, 0);
        let c11 = corner(1, 1);

        let amp = phase.abs();
        let fx = div_x as f64;
        let fy = div_y as f64;

        let x = lerp(
            lerp(
                self.x1 + cell_w * (fx + amp * c00.x),
                self.x1 + cell_w * (fx + amp * c01.x + 1.0),
                ipl_x,
            ),
            lerp(
                self.x1 + cell_w * (fx + amp * c10.x),
                self.x1 + cell_w * (fx + amp * c11.x + 1.0),
                ipl_x,
            ),
            ipl_y,
        );
        let y = lerp(
            lerp(
                self.y1 + cell_h * (fy + amp * c00.y),
                self.y1 + cell_h * (fy + amp * c10.y + 1.0),
                ipl_y,
            ),
            lerp(
                self.y1 + cell_h * (fy + amp * c01.y),
                self.y1 + cell_h * (fy + amp * c11.y + 1.0),
                ipl_y,
            ),
            ipl_x,
        );
        dvec2(x, y)
    }
}
