use bevy::prelude::*;
use std::collections::HashMap;

/// A named point of interest discovered in the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub name: String,
    pub world_position: Vec3,
    pub index: usize,
}

/// A node visited while traversing the scene, in traversal order.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub entity: Entity,
    pub name: String,
    pub world_position: Vec3,
}

/// Dense arena of anchors plus a name index.
///
/// Indices are assigned in registration order and never change, so every
/// per-anchor array in the engine (event state, marker slots) can be
/// addressed by the same index.
#[derive(Resource, Debug, Default, Clone)]
pub struct AnchorRegistry {
    anchors: Vec<Anchor>,
    by_name: HashMap<String, usize>,
    prefix: String,
}

impl AnchorRegistry {
    /// Build a registry from nodes in traversal order, keeping those whose
    /// name starts with `prefix`.
    pub fn from_nodes<'a>(prefix: &str, nodes: impl IntoIterator<Item = &'a SceneNode>) -> Self {
        let mut registry = Self {
            prefix: prefix.to_string(),
            ..default()
        };
        for node in nodes {
            if node.name.starts_with(prefix) {
                registry.register(&node.name, node.world_position);
            }
        }
        registry
    }

    /// Register an anchor, returning its index. A repeated name keeps the
    /// first registration.
    pub fn register(&mut self, name: &str, world_position: Vec3) -> Option<usize> {
        if self.by_name.contains_key(name) {
            warn!("Duplicate anchor name '{}' ignored", name);
            return None;
        }
        let index = self.anchors.len();
        self.anchors.push(Anchor {
            name: name.to_string(),
            world_position,
            index,
        });
        self.by_name.insert(name.to_string(), index);
        Some(index)
    }

    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, index: usize) -> Option<&Anchor> {
        self.anchors.get(index)
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Anchor> {
        self.anchors.iter()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Anchor closest to `point`, used when framing without a selection.
    pub fn nearest_to(&self, point: Vec3) -> Option<usize> {
        self.anchors
            .iter()
            .min_by(|a, b| {
                a.world_position
                    .distance_squared(point)
                    .total_cmp(&b.world_position.distance_squared(point))
            })
            .map(|anchor| anchor.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, position: Vec3) -> SceneNode {
        SceneNode {
            entity: Entity::PLACEHOLDER,
            name: name.to_string(),
            world_position: position,
        }
    }

    #[test]
    fn registers_prefixed_nodes_in_traversal_order() {
        let nodes = [
            node("CCTV_1", Vec3::new(1.0, 0.0, 0.0)),
            node("CCTV_2", Vec3::new(2.0, 0.0, 0.0)),
            node("Wall", Vec3::ZERO),
        ];
        let registry = AnchorRegistry::from_nodes("CCTV_", &nodes);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup("CCTV_1"), Some(0));
        assert_eq!(registry.lookup("CCTV_2"), Some(1));
        assert_eq!(registry.lookup("Wall"), None);
        assert_eq!(registry.get(1).map(|a| a.world_position.x), Some(2.0));
    }

    #[test]
    fn traversal_order_is_not_sorted() {
        let nodes = [node("CCTV_b", Vec3::ZERO), node("CCTV_a", Vec3::ZERO)];
        let registry = AnchorRegistry::from_nodes("CCTV_", &nodes);
        assert_eq!(registry.lookup("CCTV_b"), Some(0));
        assert_eq!(registry.lookup("CCTV_a"), Some(1));
    }

    #[test]
    fn duplicate_names_keep_first() {
        let mut registry = AnchorRegistry::default();
        assert_eq!(registry.register("CCTV_1", Vec3::X), Some(0));
        assert_eq!(registry.register("CCTV_1", Vec3::Y), None);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(0).map(|a| a.world_position), Some(Vec3::X));
    }

    #[test]
    fn empty_registry_misses_every_lookup() {
        let registry = AnchorRegistry::default();
        assert!(registry.is_empty());
        assert_eq!(registry.lookup("CCTV_1"), None);
        assert_eq!(registry.nearest_to(Vec3::ZERO), None);
    }

    #[test]
    fn nearest_anchor() {
        let nodes = [
            node("CCTV_1", Vec3::new(10.0, 0.0, 0.0)),
            node("CCTV_2", Vec3::new(-1.0, 0.0, 0.0)),
        ];
        let registry = AnchorRegistry::from_nodes("CCTV_", &nodes);
        assert_eq!(registry.nearest_to(Vec3::ZERO), Some(1));
    }
}
