mod compose;
mod mesh;
mod node;

pub use compose::{PartPose, BAKE_PHASES};
pub use mesh::{PartGeometry, PartMesh, Triangle, CANVAS_SCALE, TEXTURE_SIZE};
pub use node::{DeformerConfig, DeformerNode, NodeKind};

use std::collections::HashSet;

use indextree::{Arena, NodeId};
use tracing::{debug, warn};

use crate::PuppetError;

/// What to do with a part id that appears at more than one tree node.
/// A part has exactly one authoritative deformation path; under
/// `FirstWins` the first occurrence in traversal order keeps it and the
/// rest are logged and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePartPolicy {
    #[default]
    Error,
    FirstWins,
}

#[derive(Debug, Clone)]
struct TracedPart {
    part: String,
    /// Root-to-leaf ancestor path; the last node owns the part.
    path: Vec<NodeId>,
    draw_order: i32,
}

/// The assembled model: the immutable deformer tree, the part geometry
/// index, and the traced per-part ancestor paths in final draw order.
///
/// Assembly validates everything up front; a `Puppet` that exists
/// evaluates without failing.
#[derive(Debug, Clone)]
pub struct Puppet {
    nodes: Arena<DeformerNode>,
    root: NodeId,
    geometry: PartGeometry,
    traced: Vec<TracedPart>,
}

fn insert_config(arena: &mut Arena<DeformerNode>, config: DeformerConfig) -> NodeId {
    let DeformerConfig {
        kind,
        parts,
        children,
    } = config;
    let id = arena.new_node(DeformerNode { kind, parts });
    for child in children {
        let child_id = insert_config(arena, child);
        id.append(child_id, arena);
    }
    id
}

impl Puppet {
    /// Flattens the authored tree, traces every part's ancestor path, and
    /// validates the whole configuration against `geometry`.
    pub fn assemble(
        config: DeformerConfig,
        geometry: PartGeometry,
        policy: DuplicatePartPolicy,
    ) -> Result<Puppet, PuppetError> {
        let mut nodes = Arena::new();
        let root = insert_config(&mut nodes, config);

        let mut traced = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        // Pre-order DFS; `descendants` visits children in declared order,
        // and each node's path is its chain of ancestors reversed.
        for node_id in root.descendants(&nodes) {
            let node = nodes[node_id].get();
            if node.parts.is_empty() {
                continue;
            }
            let mut path: Vec<NodeId> = node_id.ancestors(&nodes).collect();
            path.reverse();
            for part in &node.parts {
                if !seen.insert(part.as_str()) {
                    match policy {
                        DuplicatePartPolicy::Error => {
                            return Err(PuppetError::DuplicatePart { part: part.clone() });
                        }
                        DuplicatePartPolicy::FirstWins => {
                            warn!(part = %part, "part attached to more than one node; keeping first");
                            continue;
                        }
                    }
                }
                let mesh = geometry
                    .get(part)
                    .ok_or_else(|| PuppetError::MissingGeometry { part: part.clone() })?;
                traced.push(TracedPart {
                    part: part.clone(),
                    path: path.clone(),
                    draw_order: mesh.draw_order,
                });
            }
        }

        // External draw order decides assembly order; ties break by part
        // id so output is reproducible.
        traced.sort_by(|a, b| {
            a.draw_order
                .cmp(&b.draw_order)
                .then_with(|| a.part.cmp(&b.part))
        });

        debug!(
            parts = traced.len(),
            nodes = nodes.count(),
            "puppet assembled"
        );

        Ok(Puppet {
            nodes,
            root,
            geometry,
            traced,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &DeformerNode {
        self.nodes[id].get()
    }

    pub fn geometry(&self) -> &PartGeometry {
        &self.geometry
    }

    /// Every `(part, root-to-leaf ancestor path)`, in final draw order.
    pub fn trace_paths(&self) -> impl Iterator<Item = (&str, &[NodeId])> {
        self.traced
            .iter()
            .map(|t| (t.part.as_str(), t.path.as_slice()))
    }
}
