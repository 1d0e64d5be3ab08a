//! Element-type id to shape factory registry.
//!
//! An element declares what it is through `elmTypeId`; its single child holds
//! the shape. The registry says which ids are supported and which shape
//! record kinds each id may be built from.

use super::consts::*;
use super::error::{AnnotationError, AnnotationResult};
use super::shape::{ShapeGeometry, ShapeKind};
use crate::hfa::{NodeData, PairLayout};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Builds shapes for one element-type id.
#[derive(Debug, Clone)]
pub struct ShapeFactory {
    /// Human-readable type name
    pub name: &'static str,
    /// Shape record kinds accepted as the element's child
    pub accepts: &'static [ShapeKind],
}

impl ShapeFactory {
    pub fn accepts(&self, kind: ShapeKind) -> bool {
        self.accepts.contains(&kind)
    }
}

/// Registry of shape factories keyed by element-type id.
#[derive(Debug, Clone, Default)]
pub struct ShapeRegistry {
    factories: BTreeMap<i64, ShapeFactory>,
}

/// Registry with the standard factories, built on first use.
pub static DEFAULT_REGISTRY: Lazy<ShapeRegistry> = Lazy::new(ShapeRegistry::standard);

impl ShapeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Text, rectangle, ellipse, polygon and polyline elements.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(
            ELEMENT_TYPE_TEXT,
            "Text",
            &[ShapeKind::Text, ShapeKind::Point],
        );
        registry.register(ELEMENT_TYPE_RECTANGLE, "Rectangle", &[ShapeKind::Rectangle]);
        registry.register(ELEMENT_TYPE_ELLIPSE, "Ellipse", &[ShapeKind::Ellipse]);
        registry.register(ELEMENT_TYPE_POLYGON, "Polygon", &[ShapeKind::Polygon]);
        registry.register(ELEMENT_TYPE_POLYLINE, "Polyline", &[ShapeKind::Polyline]);
        registry
    }

    /// Register a factory. Returns `false` if `id` was already taken, in which
    /// case the existing factory is kept.
    pub fn register(&mut self, id: i64, name: &'static str, accepts: &'static [ShapeKind]) -> bool {
        if self.factories.contains_key(&id) {
            return false;
        }
        self.factories.insert(id, ShapeFactory { name, accepts });
        true
    }

    #[inline]
    pub fn supports(&self, id: i64) -> bool {
        self.factories.contains_key(&id)
    }

    pub fn get(&self, id: i64) -> Option<&ShapeFactory> {
        self.factories.get(&id)
    }

    pub fn type_name(&self, id: i64) -> Option<&'static str> {
        self.factories.get(&id).map(|f| f.name)
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.factories.keys().copied()
    }

    /// Whether `type_name` is a shape record some factory can build.
    pub fn accepts_node_type(&self, type_name: &str) -> bool {
        ShapeKind::from_node_type(type_name)
            .is_some_and(|kind| self.factories.values().any(|f| f.accepts(kind)))
    }

    /// Build the shape of an element of type `id` from its loaded child.
    pub fn build(
        &self,
        id: i64,
        shape: &NodeData<'_>,
        layout: PairLayout,
    ) -> AnnotationResult<ShapeGeometry> {
        let factory = self.get(id).ok_or(AnnotationError::UnregisteredType(id))?;
        let type_name = shape.node().type_name();
        let kind = ShapeKind::from_node_type(type_name)
            .ok_or_else(|| AnnotationError::UnsupportedShape(type_name.to_string()))?;
        if !factory.accepts(kind) {
            return Err(AnnotationError::ShapeMismatch {
                id,
                name: factory.name,
                shape: type_name.to_string(),
            });
        }
        kind.decode(shape, layout)
    }
}
