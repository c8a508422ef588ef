use glam::{dvec2, DVec2};

/// Rotation deformer: rotates its subtree about a fixed pivot by an angle
/// interpolated between two authored extremes.
///
/// `angles` holds degrees at the two phase extremes, `[at -1, at +1]`;
/// `None` means the node never rotates.
#[derive(Debug, Clone)]
pub struct RotationDeformer {
    pub cx: f64,
    pub cy: f64,
    angles: Option<[f64; 2]>,
}

impl RotationDeformer {
    pub fn new(cx: f64, cy: f64) -> RotationDeformer {
        RotationDeformer {
            cx,
            cy,
            angles: None,
        }
    }

    pub fn with_angles(mut self, negative: f64, positive: f64) -> RotationDeformer {
        self.angles = Some([negative, positive]);
        self
    }

    pub fn is_animated(&self) -> bool {
        self.angles.is_some()
    }

    pub fn pivot(&self) -> DVec2 {
        dvec2(self.cx, self.cy)
    }

    /// Rotation in degrees at `phase`: the sign selects the extreme, the
    /// magnitude scales it.
    pub fn angle(&self, phase: f64) -> f64 {
        let extreme = match self.angles {
            Some([negative, positive]) => {
                if phase < 0.0 {
                    negative
                } else {
                    positive
                }
            }
            None => 0.0,
        };
        phase.abs() * extreme
    }
}
