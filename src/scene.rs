use serde::Serialize;

use crate::math::affine::Affine2;

/// Cubic bezier easing control points, in the unit square.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Easing {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// Easing out of an extreme keyframe toward the rest pose.
pub const EASE_TOWARD_REST: Easing = Easing {
    x1: 0.34,
    y1: 0.0,
    x2: 0.64,
    y2: 0.43,
};

/// Easing out of the rest pose toward an extreme keyframe.
pub const EASE_FROM_REST: Easing = Easing {
    x1: 0.36,
    y1: 0.57,
    x2: 0.66,
    y2: 1.0,
};

/// Duration of one baked sweep from phase -1 to +1, in seconds. The loop
/// alternates, so a full cycle takes twice this.
pub const LOOP_SECONDS: f64 = 2.0;

/// A transform attribute on a scene group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Transform {
    /// `matrix(a, b, c, d, e, f)`.
    Matrix(Affine2),
    /// Rotation in degrees about a fixed pixel-space pivot.
    Rotate { degrees: f64, cx: f64, cy: f64 },
}

/// One keyframe of a baked track. `offset` is the position in the loop,
/// in `[0, 1]`; `easing` shapes the segment leaving this keyframe and is
/// absent on the last one.
#[derive(Debug, Clone, Serialize)]
pub struct Keyframe {
    pub offset: f64,
    pub transform: Transform,
    pub easing: Option<Easing>,
}

/// A keyframe animation bound to one scene group by id.
#[derive(Debug, Clone, Serialize)]
pub struct KeyframeTrack {
    pub id: String,
    pub duration_secs: f64,
    pub alternate: bool,
    pub keyframes: Vec<Keyframe>,
}

/// A node of the emitted scene fragment.
///
/// Nested transforms compose multiplicatively in render order: a child's
/// transform acts in the coordinate space already transformed by its
/// parent. The consuming renderer must honor that, or pre-flatten with
/// [`crate::puppet::Puppet::flattened_pose`].
#[derive(Debug, Clone, Serialize)]
pub enum SceneNode {
    Group {
        id: String,
        transform: Option<Transform>,
        /// Id of the [`KeyframeTrack`] driving this group, if animated.
        animation: Option<String>,
        children: Vec<SceneNode>,
    },
    /// Stand-in for the externally constructed renderable of one triangle
    /// of a part, in index-triple order.
    Element { part: String, triangle: usize },
}

impl SceneNode {
    pub fn group(id: impl Into<String>, children: Vec<SceneNode>) -> SceneNode {
        SceneNode::Group {
            id: id.into(),
            transform: None,
            animation: None,
            children,
        }
    }
}

/// A baked scene fragment: the nested group tree plus every keyframe
/// track it references, ready for the caller to serialize.
#[derive(Debug, Clone, Serialize)]
pub struct SceneFragment {
    pub root: SceneNode,
    pub tracks: Vec<KeyframeTrack>,
}
