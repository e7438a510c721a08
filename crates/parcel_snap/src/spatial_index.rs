//! Region quadtree keyed by item, with visitor-style traversal.
//!
//! Each item is stored in the deepest node whose bounds fully contain it, so
//! a subtree can be skipped as soon as its node bounds fail the visitor's
//! intersection test. Items that straddle quadrant boundaries (or fall
//! outside the world bounds) stay in the shallower node.

use std::collections::HashMap;
use std::hash::Hash;

use bevy::prelude::*;

use crate::config::{WORLD_MAX, WORLD_MIN};
use crate::geometry::Bounds2;

const MAX_DEPTH: u32 = 10;

/// Items held by a leaf before it splits.
const SPLIT_THRESHOLD: usize = 8;

/// Callback pair driven by [`QuadTree::iterate`].
pub trait SpatialVisitor<T> {
    /// Return `false` to prune everything inside `bounds`.
    fn intersect(&mut self, bounds: &Bounds2) -> bool;
    fn visit(&mut self, bounds: &Bounds2, item: T);
}

struct QuadNode<T> {
    bounds: Bounds2,
    items: Vec<(Bounds2, T)>,
    children: Option<Box<[QuadNode<T>; 4]>>,
}

impl<T: Copy> QuadNode<T> {
    fn new(bounds: Bounds2) -> Self {
        Self {
            bounds,
            items: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, bounds: Bounds2, item: T, depth: u32) {
        if self.children.is_none() && self.items.len() >= SPLIT_THRESHOLD && depth < MAX_DEPTH {
            self.split(depth);
        }
        if let Some(children) = self.children.as_mut() {
            if let Some(child) = children.iter_mut().find(|c| c.bounds.contains(&bounds)) {
                child.insert(bounds, item, depth + 1);
                return;
            }
        }
        self.items.push((bounds, item));
    }

    fn split(&mut self, depth: u32) {
        let quads = self.bounds.quadrants();
        let mut children = Box::new(quads.map(QuadNode::new));
        let items = std::mem::take(&mut self.items);
        for (bounds, item) in items {
            if let Some(child) = children.iter_mut().find(|c| c.bounds.contains(&bounds)) {
                child.insert(bounds, item, depth + 1);
            } else {
                self.items.push((bounds, item));
            }
        }
        self.children = Some(children);
    }

    fn iterate<V: SpatialVisitor<T>>(&self, visitor: &mut V) {
        for (bounds, item) in &self.items {
            if visitor.intersect(bounds) {
                visitor.visit(bounds, *item);
            }
        }
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                if visitor.intersect(&child.bounds) {
                    child.iterate(visitor);
                }
            }
        }
    }
}

impl<T: Copy + PartialEq> QuadNode<T> {
    fn remove(&mut self, bounds: &Bounds2, item: T) -> bool {
        if let Some(idx) = self.items.iter().position(|(_, i)| *i == item) {
            self.items.swap_remove(idx);
            return true;
        }
        match self.children.as_mut() {
            Some(children) => children
                .iter_mut()
                .filter(|c| c.bounds.contains(bounds))
                .any(|c| c.remove(bounds, item)),
            None => false,
        }
    }
}

/// Point/region quadtree over the XZ plane.
pub struct QuadTree<T> {
    root: QuadNode<T>,
    entries: HashMap<T, Bounds2>,
}

impl<T: Copy + Eq + Hash> Default for QuadTree<T> {
    fn default() -> Self {
        Self::new(Bounds2::new(Vec2::splat(WORLD_MIN), Vec2::splat(WORLD_MAX)))
    }
}

impl<T: Copy + Eq + Hash> QuadTree<T> {
    pub fn new(world: Bounds2) -> Self {
        Self {
            root: QuadNode::new(world),
            entries: HashMap::new(),
        }
    }

    /// Insert or move an item.
    pub fn insert(&mut self, item: T, bounds: Bounds2) {
        if let Some(old) = self.entries.insert(item, bounds) {
            self.root.remove(&old, item);
        }
        self.root.insert(bounds, item, 0);
    }

    pub fn remove(&mut self, item: T) -> bool {
        match self.entries.remove(&item) {
            Some(bounds) => self.root.remove(&bounds, item),
            None => false,
        }
    }

    pub fn bounds_of(&self, item: T) -> Option<Bounds2> {
        self.entries.get(&item).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        let world = self.root.bounds;
        self.root = QuadNode::new(world);
        self.entries.clear();
    }

    pub fn iterate<V: SpatialVisitor<T>>(&self, visitor: &mut V) {
        if visitor.intersect(&self.root.bounds) || !self.root.items.is_empty() {
            self.root.iterate(visitor);
        }
    }
}
