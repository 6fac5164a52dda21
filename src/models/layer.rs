// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Canvas layers.
//!
//! A layer is an ordered list of scene objects drawn together. The stage
//! always stacks exactly three of them: grid, map images, markers.

use super::scene::{GridLine, ObjectId, Part, SceneObject};
use crate::controller::interaction::Interaction;
use crate::util::geometry::{Point, Size, Transform};
use std::fmt;
use uuid::Uuid;

/// The three layers of the stage, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Grid,
    Map,
    Marker,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayerKind::Grid => "grid",
            LayerKind::Map => "map",
            LayerKind::Marker => "marker",
        };
        f.write_str(name)
    }
}

/// One object on a layer plus the controller wired to it.
#[derive(Debug)]
pub struct SceneNode {
    pub id: ObjectId,
    pub object: SceneObject,
    pub interaction: Option<Interaction>,
}

#[derive(Debug)]
pub struct Layer {
    kind: LayerKind,
    transform: Transform,
    nodes: Vec<SceneNode>,
}

impl Layer {
    pub fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            transform: Transform::IDENTITY,
            nodes: Vec::new(),
        }
    }

    /// Build the grid layer: `rows` x `cols` cells of `cell` size.
    pub fn grid(rows: usize, cols: usize, cell: Size) -> Self {
        let mut layer = Self::new(LayerKind::Grid);
        let width = cols as f64 * cell.width;
        let height = rows as f64 * cell.height;

        for row in 0..=rows {
            let y = row as f64 * cell.height;
            layer.add(SceneObject::GridLine(GridLine {
                start: Point::new(0.0, y),
                end: Point::new(width, y),
            }));
        }
        for col in 0..=cols {
            let x = col as f64 * cell.width;
            layer.add(SceneObject::GridLine(GridLine {
                start: Point::new(x, 0.0),
                end: Point::new(x, height),
            }));
        }

        layer
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// The layer's own transform relative to the stage.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Append an object on top of the layer and return its id.
    pub fn add(&mut self, object: SceneObject) -> ObjectId {
        let id = Uuid::new_v4();
        self.nodes.push(SceneNode {
            id,
            object,
            interaction: None,
        });
        id
    }

    /// Wire an interaction controller to an existing object.
    pub fn attach(&mut self, id: ObjectId, interaction: Interaction) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.interaction = Some(interaction);
                true
            }
            None => false,
        }
    }

    /// Remove an object with all of its primitives.
    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        let index = self.nodes.iter().position(|node| node.id == id)?;
        Some(self.nodes.remove(index).object)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.nodes.iter().find(|node| node.id == id).map(|node| &node.object)
    }

    pub fn node_mut(&mut self, id: ObjectId) -> Option<&mut SceneNode> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.iter()
    }

    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.nodes.iter().map(|node| &node.object)
    }

    /// Number of logical objects.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of drawable primitives, counting each arrow as four.
    pub fn primitive_count(&self) -> usize {
        self.nodes.iter().map(|node| node.object.primitive_count()).sum()
    }

    /// Topmost object under `point` (layer space), skipping objects
    /// `visible` rejects.
    pub fn hit_test(
        &self,
        point: Point,
        visible: impl Fn(&SceneObject) -> bool,
    ) -> Option<(ObjectId, Part)> {
        self.nodes
            .iter()
            .rev()
            .filter(|node| visible(&node.object))
            .find_map(|node| node.object.hit_test(point).map(|part| (node.id, part)))
    }
}
