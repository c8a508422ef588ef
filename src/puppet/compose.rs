use glam::DVec2;

use crate::deformer::rotation_deformer::RotationDeformer;
use crate::math::affine::{solve_triangle_affine, Affine2};
use crate::scene::{
    Keyframe, KeyframeTrack, SceneFragment, SceneNode, Transform, EASE_FROM_REST,
    EASE_TOWARD_REST, LOOP_SECONDS,
};
use crate::PuppetError;

use super::mesh::{Triangle, TEXTURE_SIZE};
use super::node::NodeKind;
use super::{Puppet, TracedPart};

/// Phases sampled for baked three-keyframe output.
pub const BAKE_PHASES: [f64; 3] = [-1.0, 0.0, 1.0];

/// Live evaluation output for one part at a single phase, in final draw
/// order. `triangles` matches the part's triangle order positionally.
#[derive(Debug, Clone)]
pub struct PartPose {
    pub part: String,
    /// Rotation ancestors root-to-leaf: degrees about a pixel-space pivot.
    /// Empty in the flattened form, where they are folded into the
    /// triangle matrices.
    pub rotations: Vec<(f64, DVec2)>,
    pub triangles: Vec<Affine2>,
}

fn keyframe(index: usize, phase: f64, transform: Transform) -> Keyframe {
    let easing = match index {
        0 => Some(EASE_TOWARD_REST),
        1 => Some(EASE_FROM_REST),
        _ => None,
    };
    Keyframe {
        offset: (phase + 1.0) / 2.0,
        transform,
        easing,
    }
}

impl Puppet {
    /// Affine matrix carrying one triangle's texture-space source onto
    /// its (possibly warped) destination position, at `phase`.
    ///
    /// Only the owning node warps geometry; intermediate warp ancestors
    /// merely group their subtree.
    fn triangle_matrix(
        &self,
        owner: &NodeKind,
        part: &str,
        index: usize,
        tri: &Triangle,
        phase: f64,
    ) -> Result<Affine2, PuppetError> {
        let src = tri.uvs.map(|uv| uv * TEXTURE_SIZE);
        let dst = match owner {
            NodeKind::Warp(warp) => tri.positions.map(|p| warp.warp(p, phase) * TEXTURE_SIZE),
            NodeKind::Rotation(_) => tri.positions.map(|p| p * TEXTURE_SIZE),
        };
        let matrix = solve_triangle_affine(src, dst);
        if !matrix.is_finite() {
            return Err(PuppetError::DegenerateTriangle {
                part: part.to_string(),
                triangle: index,
            });
        }
        Ok(matrix)
    }

    fn part_pose(&self, traced: &TracedPart, phase: f64) -> Result<PartPose, PuppetError> {
        let mesh = self
            .geometry
            .get(&traced.part)
            .ok_or_else(|| PuppetError::MissingGeometry {
                part: traced.part.clone(),
            })?;
        let owner_id = *traced.path.last().expect("traced path is never empty");
        let owner = &self.node(owner_id).kind;

        let rotations = traced
            .path
            .iter()
            .filter_map(|&id| match &self.node(id).kind {
                NodeKind::Rotation(rot) => Some((rot.angle(phase), rot.pivot() * TEXTURE_SIZE)),
                NodeKind::Warp(_) => None,
            })
            .collect();

        let mut triangles = Vec::with_capacity(mesh.triangles.len());
        for (i, tri) in mesh.triangles.iter().enumerate() {
            triangles.push(
                self.triangle_matrix(owner, &traced.part, i, tri, phase)?
                    .rounded(),
            );
        }

        Ok(PartPose {
            part: traced.part.clone(),
            rotations,
            triangles,
        })
    }

    /// Samples the whole model at a live `phase`. Pure per invocation; a
    /// playback driver calls this once per tick with a fresh phase.
    pub fn pose(&self, phase: f64) -> Result<Vec<PartPose>, PuppetError> {
        self.traced.iter().map(|t| self.part_pose(t, phase)).collect()
    }

    /// Like [`Puppet::pose`], but with every rotation ancestor
    /// pre-multiplied into the triangle matrices, for renderers that want
    /// one flat transform per triangle instead of nested groups.
    pub fn flattened_pose(&self, phase: f64) -> Result<Vec<PartPose>, PuppetError> {
        let mut poses = self.pose(phase)?;
        for pose in &mut poses {
            let mut outer = Affine2::IDENTITY;
            // Root-to-leaf: each rotation acts in the space already
            // rotated by its ancestors.
            for (degrees, pivot) in pose.rotations.drain(..) {
                outer = outer.mul(&Affine2::rotation_about(degrees, pivot));
            }
            for matrix in &mut pose.triangles {
                *matrix = outer.mul(matrix).rounded();
            }
        }
        Ok(poses)
    }

    fn rotation_group(
        &self,
        rot: &RotationDeformer,
        part: &str,
        depth: usize,
        child: SceneNode,
        tracks: &mut Vec<KeyframeTrack>,
    ) -> SceneNode {
        let id = format!("rotate_{part}_{depth}");
        let animation = if rot.is_animated() {
            let pivot = rot.pivot() * TEXTURE_SIZE;
            let track_id = format!("anim_{id}");
            tracks.push(KeyframeTrack {
                id: track_id.clone(),
                duration_secs: LOOP_SECONDS,
                alternate: true,
                keyframes: BAKE_PHASES
                    .iter()
                    .enumerate()
                    .map(|(i, &phase)| {
                        keyframe(
                            i,
                            phase,
                            Transform::Rotate {
                                degrees: rot.angle(phase),
                                cx: pivot.x,
                                cy: pivot.y,
                            },
                        )
                    })
                    .collect(),
            });
            Some(track_id)
        } else {
            None
        };
        SceneNode::Group {
            id,
            transform: None,
            animation,
            children: vec![child],
        }
    }

    fn bake_part(
        &self,
        traced: &TracedPart,
        tracks: &mut Vec<KeyframeTrack>,
    ) -> Result<SceneNode, PuppetError> {
        let mesh = self
            .geometry
            .get(&traced.part)
            .ok_or_else(|| PuppetError::MissingGeometry {
                part: traced.part.clone(),
            })?;
        let owner_id = *traced.path.last().expect("traced path is never empty");
        let owner = &self.node(owner_id).kind;
        let warp_animated = matches!(owner, NodeKind::Warp(w) if w.is_animated());

        let mut triangle_groups = Vec::with_capacity(mesh.triangles.len());
        for (i, tri) in mesh.triangles.iter().enumerate() {
            let id = format!("poly_{}_{}", traced.part, i);
            let element = SceneNode::Element {
                part: traced.part.clone(),
                triangle: i,
            };
            let (transform, animation) = if warp_animated {
                let track_id = format!("anim_{id}");
                let mut keyframes = Vec::with_capacity(BAKE_PHASES.len());
                for (k, &phase) in BAKE_PHASES.iter().enumerate() {
                    let matrix = self
                        .triangle_matrix(owner, &traced.part, i, tri, phase)?
                        .rounded();
                    keyframes.push(keyframe(k, phase, Transform::Matrix(matrix)));
                }
                tracks.push(KeyframeTrack {
                    id: track_id.clone(),
                    duration_secs: LOOP_SECONDS,
                    alternate: true,
                    keyframes,
                });
                (None, Some(track_id))
            } else {
                let matrix = self
                    .triangle_matrix(owner, &traced.part, i, tri, 0.0)?
                    .rounded();
                (Some(Transform::Matrix(matrix)), None)
            };
            triangle_groups.push(SceneNode::Group {
                id,
                transform,
                animation,
                children: vec![element],
            });
        }

        // Innermost wrapper is the owning node's own group; each ancestor
        // wraps the previous result, so the root ends up outermost.
        let mut current = SceneNode::group(format!("part_{}", traced.part), triangle_groups);
        for (depth, &node_id) in traced.path.iter().enumerate().rev() {
            current = match &self.node(node_id).kind {
                NodeKind::Warp(_) => {
                    if node_id == owner_id {
                        // Its warp already lives in the triangle matrices.
                        current
                    } else {
                        SceneNode::group(format!("node_{}_{}", traced.part, depth), vec![current])
                    }
                }
                NodeKind::Rotation(rot) => {
                    self.rotation_group(rot, &traced.part, depth, current, tracks)
                }
            };
        }
        Ok(current)
    }

    /// Bakes the three-keyframe loop: one nested scene fragment per part,
    /// assembled in draw order, with every keyframe track it references.
    /// Identifiers are content-derived, so repeated bakes are
    /// byte-for-byte identical.
    pub fn bake(&self) -> Result<SceneFragment, PuppetError> {
        let mut tracks = Vec::new();
        let mut children = Vec::with_capacity(self.traced.len());
        for traced in &self.traced {
            children.push(self.bake_part(traced, &mut tracks)?);
        }
        Ok(SceneFragment {
            root: SceneNode::group("scene", children),
            tracks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deformer::warp_deformer::WarpDeformer;
    use crate::puppet::{DeformerConfig, DuplicatePartPolicy, PartGeometry};
    use glam::dvec2;

    fn corner_shift_warp() -> WarpDeformer {
        // Top-left lattice corner shifts +0.1 in x at phase >= 0.
        let zero = vec![vec![DVec2::ZERO; 2]; 2];
        let mut positive = vec![vec![DVec2::ZERO; 2]; 2];
        positive[0][0] = dvec2(0.1, 0.0);
        WarpDeformer::new(-1.0, -1.0, 1.0, 1.0, 1, 1)
            .with_lattices(zero, positive)
            .unwrap()
    }

    fn unit_triangle_part() -> PartGeometry {
        let mut geometry = PartGeometry::new();
        geometry
            .insert_triangles(
                "skirt",
                vec![Triangle {
                    positions: [dvec2(-1.0, -1.0), dvec2(1.0, -1.0), dvec2(-1.0, 1.0)],
                    uvs: [dvec2(-1.0, -1.0), dvec2(1.0, -1.0), dvec2(-1.0, 1.0)],
                }],
                0,
            )
            .unwrap();
        geometry
    }

    fn assert_close(got: DVec2, want: DVec2, tol: f64) {
        assert!((got - want).length() < tol, "got {got:?}, want {want:?}");
    }

    #[test]
    fn corner_shift_moves_only_the_shifted_vertex() {
        let config = DeformerConfig::warp(corner_shift_warp()).with_parts(["skirt"]);
        let puppet =
            Puppet::assemble(config, unit_triangle_part(), DuplicatePartPolicy::Error).unwrap();

        let poses = puppet.pose(1.0).unwrap();
        assert_eq!(poses.len(), 1);
        let matrix = &poses[0].triangles[0];

        // Vertex (-1, -1) sits on the shifted corner: moved one cell width
        // (2.0) times the 0.1 displacement. Matrices are rounded to three
        // decimals, so allow a few pixels at texture scale.
        let scale = TEXTURE_SIZE;
        assert_close(
            matrix.transform_point(dvec2(-scale, -scale)),
            dvec2(-0.8 * scale, -scale),
            3.0,
        );
        assert_close(
            matrix.transform_point(dvec2(scale, -scale)),
            dvec2(scale, -scale),
            3.0,
        );
        assert_close(
            matrix.transform_point(dvec2(-scale, scale)),
            dvec2(-scale, scale),
            3.0,
        );
    }

    #[test]
    fn zero_phase_pose_is_identity_for_matching_uvs() {
        let config = DeformerConfig::warp(corner_shift_warp()).with_parts(["skirt"]);
        let puppet =
            Puppet::assemble(config, unit_triangle_part(), DuplicatePartPolicy::Error).unwrap();

        let poses = puppet.pose(0.0).unwrap();
        let matrix = &poses[0].triangles[0];
        for (got, want) in matrix.0.iter().zip(Affine2::IDENTITY.0) {
            assert!((got - want).abs() < 1e-3);
        }
    }

    #[test]
    fn baked_nesting_runs_root_to_leaf() {
        use crate::deformer::rotation_deformer::RotationDeformer;

        let config = DeformerConfig::warp(WarpDeformer::new(-1.0, -1.0, 1.0, 1.0, 1, 1))
            .with_children(vec![DeformerConfig::rotation(
                RotationDeformer::new(0.0, 0.49).with_angles(-5.0, 5.0),
            )
            .with_children(vec![
                DeformerConfig::warp(corner_shift_warp()).with_parts(["skirt"])
            ])]);
        let puppet =
            Puppet::assemble(config, unit_triangle_part(), DuplicatePartPolicy::Error).unwrap();

        let fragment = puppet.bake().unwrap();

        // scene -> root warp group -> rotate group -> part group ->
        // triangle group -> element.
        let SceneNode::Group { id, children, .. } = &fragment.root else {
            panic!("root is a group");
        };
        assert_eq!(id, "scene");
        let SceneNode::Group { id, children, .. } = &children[0] else {
            panic!("outermost wrapper is the root node's group");
        };
        assert_eq!(id, "node_skirt_0");
        let SceneNode::Group {
            id,
            animation,
            children,
            ..
        } = &children[0]
        else {
            panic!("rotate wrapper");
        };
        assert_eq!(id, "rotate_skirt_1");
        assert_eq!(animation.as_deref(), Some("anim_rotate_skirt_1"));
        let SceneNode::Group { id, children, .. } = &children[0] else {
            panic!("part wrapper");
        };
        assert_eq!(id, "part_skirt");
        let SceneNode::Group {
            id,
            animation,
            children,
            ..
        } = &children[0]
        else {
            panic!("triangle wrapper");
        };
        assert_eq!(id, "poly_skirt_0");
        assert_eq!(animation.as_deref(), Some("anim_poly_skirt_0"));
        assert!(matches!(
            children[0],
            SceneNode::Element { triangle: 0, .. }
        ));

        // One rotation track and one triangle track, each three keyframes
        // at offsets 0, 1/2, 1.
        assert_eq!(fragment.tracks.len(), 2);
        for track in &fragment.tracks {
            let offsets: Vec<f64> = track.keyframes.iter().map(|k| k.offset).collect();
            assert_eq!(offsets, [0.0, 0.5, 1.0]);
            assert!(track.keyframes[0].easing.is_some());
            assert!(track.keyframes[1].easing.is_some());
            assert!(track.keyframes[2].easing.is_none());
        }
    }

    #[test]
    fn static_tree_bakes_plain_transforms_and_no_tracks() {
        let config = DeformerConfig::warp(WarpDeformer::new(-1.0, -1.0, 1.0, 1.0, 1, 1))
            .with_parts(["skirt"]);
        let puppet =
            Puppet::assemble(config, unit_triangle_part(), DuplicatePartPolicy::Error).unwrap();

        let fragment = puppet.bake().unwrap();
        assert!(fragment.tracks.is_empty());

        let SceneNode::Group { children, .. } = &fragment.root else {
            panic!("root is a group");
        };
        let SceneNode::Group { children, .. } = &children[0] else {
            panic!("part wrapper");
        };
        let SceneNode::Group {
            transform,
            animation,
            ..
        } = &children[0]
        else {
            panic!("triangle wrapper");
        };
        assert!(animation.is_none());
        // Identity warp with uvs == positions gives the identity matrix.
        assert_eq!(
            transform.as_ref(),
            Some(&Transform::Matrix(Affine2::IDENTITY))
        );
    }

    #[test]
    fn flattened_pose_matches_nested_rotation() {
        use crate::deformer::rotation_deformer::RotationDeformer;

        let config = DeformerConfig::rotation(
            RotationDeformer::new(0.25, -0.5).with_angles(-30.0, 30.0),
        )
        .with_children(vec![
            DeformerConfig::warp(corner_shift_warp()).with_parts(["skirt"])
        ]);
        let puppet =
            Puppet::assemble(config, unit_triangle_part(), DuplicatePartPolicy::Error).unwrap();

        let phase = 0.75;
        let nested = &puppet.pose(phase).unwrap()[0];
        let flat = &puppet.flattened_pose(phase).unwrap()[0];
        assert!(flat.rotations.is_empty());

        let (degrees, pivot) = nested.rotations[0];
        let rotation = Affine2::rotation_about(degrees, pivot);
        let probe = dvec2(-TEXTURE_SIZE, -TEXTURE_SIZE);
        let via_nested = rotation.transform_point(nested.triangles[0].transform_point(probe));
        let via_flat = flat.triangles[0].transform_point(probe);
        // Both sides carry their own 3-decimal rounding.
        assert_close(via_nested, via_flat, 6.0);
    }
}
