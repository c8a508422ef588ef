use crate::deformer::rotation_deformer::RotationDeformer;
use crate::deformer::warp_deformer::WarpDeformer;

/// The two deformer primitives. The set is closed; traversal and
/// composition match on it exhaustively.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Warp(WarpDeformer),
    Rotation(RotationDeformer),
}

/// One node of the assembled deformer hierarchy: its deformer plus the
/// parts attached directly to it. Children live in the arena.
#[derive(Debug, Clone)]
pub struct DeformerNode {
    pub kind: NodeKind,
    pub parts: Vec<String>,
}

/// Hand-authored tree literal, flattened into the arena at assembly.
/// Owned children make cycles unrepresentable.
#[derive(Debug, Clone)]
pub struct DeformerConfig {
    pub kind: NodeKind,
    pub parts: Vec<String>,
    pub children: Vec<DeformerConfig>,
}

impl DeformerConfig {
    pub fn new(kind: NodeKind) -> DeformerConfig {
        DeformerConfig {
            kind,
            parts: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn warp(deformer: WarpDeformer) -> DeformerConfig {
        DeformerConfig::new(NodeKind::Warp(deformer))
    }

    pub fn rotation(deformer: RotationDeformer) -> DeformerConfig {
        DeformerConfig::new(NodeKind::Rotation(deformer))
    }

    pub fn with_parts<I, S>(mut self, parts: I) -> DeformerConfig
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parts = parts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_children(mut self, children: Vec<DeformerConfig>) -> DeformerConfig {
        self.children = children;
        self
    }
}
