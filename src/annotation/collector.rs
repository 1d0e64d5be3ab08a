//! Depth-first walk over the element list.

use super::config::ExtractOptions;
use super::consts::{ELEMENT_TYPE_ID_FIELD, ELEMENT_TYPES};
use super::element::Annotation;
use super::registry::ShapeRegistry;
use crate::common::{Error, Result};
use crate::hfa::{HfaFile, Node};
use smallvec::SmallVec;
use std::collections::BTreeSet;
use tracing::{debug, error, warn};

/// Result of one collection pass.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    /// Annotations in traversal order
    pub annotations: Vec<Annotation>,
    /// Distinct element-type ids among `annotations`
    pub geometry_types: BTreeSet<i64>,
    /// Element nodes that could not be decoded
    pub skipped: usize,
}

/// Walks an element list and decodes every supported element.
#[derive(Debug, Clone, Copy)]
pub struct AnnotationCollector<'r> {
    registry: &'r ShapeRegistry,
    options: &'r ExtractOptions,
}

impl<'r> AnnotationCollector<'r> {
    pub fn new(registry: &'r ShapeRegistry, options: &'r ExtractOptions) -> Self {
        Self { registry, options }
    }

    /// Locate the element list and collect its annotations.
    ///
    /// A missing element list is the only failure; problems with individual
    /// elements are logged and counted in [`Collected::skipped`].
    pub fn collect(&self, file: &HfaFile) -> Result<Collected> {
        let name = &self.options.element_list;
        let Some(list) = file.find(name) else {
            error!(element_list = %name, "element list not found");
            return Err(Error::MissingElementList(name.clone()));
        };
        Ok(self.collect_from(list))
    }

    /// Collect from the subtree below `list`, children first, then siblings.
    pub fn collect_from(&self, list: Node<'_>) -> Collected {
        let mut out = Collected::default();
        let mut stack: Vec<Node<'_>> = list.children().collect();
        stack.reverse();

        while let Some(node) = stack.pop() {
            let children: SmallVec<[Node<'_>; 4]> = node.children().collect();
            stack.extend(children.into_iter().rev());
            self.visit(node, &mut out);
        }

        debug!(
            annotations = out.annotations.len(),
            skipped = out.skipped,
            "collected annotations"
        );
        out
    }

    fn visit(&self, node: Node<'_>, out: &mut Collected) {
        if !ELEMENT_TYPES.contains(&node.type_name()) {
            return;
        }

        let element = match node.load_data() {
            Ok(data) => data,
            Err(e) => {
                warn!(node = node.name(), node_type = node.type_name(), error = %e, "skipping unreadable element");
                out.skipped += 1;
                return;
            },
        };

        let type_id = match element.get_int_field(ELEMENT_TYPE_ID_FIELD) {
            Ok(id) => id,
            Err(e) => {
                warn!(node = node.name(), error = %e, "element has no type id");
                out.skipped += 1;
                return;
            },
        };
        if type_id == 0 || !self.registry.supports(type_id) {
            debug!(node = node.name(), type_id, "no shape factory for element type");
            return;
        }

        let shapes: SmallVec<[Node<'_>; 2]> = node
            .children()
            .filter(|child| self.registry.accepts_node_type(child.type_name()))
            .collect();
        let [shape] = shapes.as_slice() else {
            debug!(
                node = node.name(),
                shapes = shapes.len(),
                "element does not have exactly one shape child"
            );
            return;
        };

        let result = shape.load_data().map_err(Into::into).and_then(|shape_data| {
            Annotation::decode(&element, &shape_data, self.registry, self.options.pair_layout)
        });
        match result {
            Ok(annotation) => {
                out.geometry_types.insert(type_id);
                out.annotations.push(annotation);
            },
            Err(e) => {
                warn!(
                    node = node.name(),
                    shape = shape.name(),
                    shape_type = shape.type_name(),
                    error = %e,
                    "skipping annotation"
                );
                out.skipped += 1;
            },
        }
    }
}
