//! Assembly tree.
//!
//! Nodes live in a single arena owned by [`BomTree`] and refer to each other
//! by [`NodeId`]. A node owns its ordered child links; the parent link is a
//! plain back-reference index, so no reference cycles exist in memory even
//! though navigation works in both directions.

use std::fmt;

use crate::error::{BomError, BomResult};
use crate::part_table::PartTable;

/// Index of a node inside its [`BomTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Edge from a parent to a sub-assembly, created by one parent row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildLink {
    pub node: NodeId,
    /// Index into the parent's rows of the row that references the child.
    pub row: usize,
    /// That row's quantity; applied to everything below the child.
    pub multiplier: f64,
}

/// One assembly level: a named part table plus its tree links.
#[derive(Debug, Clone)]
pub struct BomNode {
    name: Option<String>,
    table: PartTable,
    parent: Option<NodeId>,
    children: Vec<ChildLink>,
}

impl BomNode {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn table(&self) -> &PartTable {
        &self.table
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[ChildLink] {
        &self.children
    }

    pub fn fields(&self) -> &[String] {
        self.table.fields()
    }

    pub fn parts(&self) -> Vec<&str> {
        self.table.part_numbers()
    }

    /// Child attached through the given row, if any.
    pub fn child_for_row(&self, row: usize) -> Option<&ChildLink> {
        self.children.iter().find(|link| link.row == row)
    }

    /// Name followed by the full table.
    pub fn verbose(&self) -> String {
        format!("{}\n\n{}\n", self.display_name(), self.table)
    }

    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.table.source())
    }
}

impl fmt::Display for BomNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({} items)", name, self.table.len()),
            None => write!(f, "BOM with {} items", self.table.len()),
        }
    }
}

/// Arena holding every BOM of a project.
#[derive(Debug, Clone, Default)]
pub struct BomTree {
    nodes: Vec<BomNode>,
}

impl BomTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a detached node.
    pub fn add_node(&mut self, table: PartTable, name: Option<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(BomNode {
            name,
            table,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Adds a node and attaches it under `parent` through `row` in one step.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        row: usize,
        table: PartTable,
        name: Option<String>,
    ) -> BomResult<NodeId> {
        self.check_row(parent, row)?;
        let id = self.add_node(table, name);
        self.attach(parent, row, id)?;
        Ok(id)
    }

    /// Makes `child` a sub-assembly of `parent`, referenced by `parent`'s row
    /// at index `row`. Both directions of the link are updated together.
    pub fn attach(&mut self, parent: NodeId, row: usize, child: NodeId) -> BomResult<()> {
        self.check_row(parent, row)?;
        let part_number = self.nodes[parent.0].table.rows()[row].part_number.clone();
        let files = || vec![self.label(parent), self.label(child)];

        if parent == child {
            return Err(BomError::structural(
                part_number,
                vec![self.label(child)],
                "assembly references itself",
            ));
        }
        if self.is_ancestor(child, parent) {
            return Err(BomError::structural(
                part_number,
                files(),
                "reference would create a cycle",
            ));
        }
        if let Some(existing) = self.nodes[child.0].parent {
            let mut implicated = files();
            implicated.push(self.label(existing));
            return Err(BomError::structural(
                part_number,
                implicated,
                "sub-assembly is referenced more than once",
            ));
        }
        if self.nodes[parent.0].child_for_row(row).is_some() {
            return Err(BomError::structural(
                part_number,
                files(),
                "row already references another sub-assembly",
            ));
        }

        let multiplier = self.nodes[parent.0].table.rows()[row].quantity;
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(ChildLink {
            node: child,
            row,
            multiplier,
        });
        Ok(())
    }

    fn check_row(&self, parent: NodeId, row: usize) -> BomResult<()> {
        let table = &self.nodes[parent.0].table;
        if row >= table.len() {
            return Err(BomError::structural(
                format!("#{}", row),
                vec![self.label(parent)],
                format!("row index out of range ({} rows)", table.len()),
            ));
        }
        Ok(())
    }

    /// Node by id. Ids only come from this tree, so lookup cannot fail.
    pub fn node(&self, id: NodeId) -> &BomNode {
        &self.nodes[id.0]
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0].children.iter().map(|link| link.node)
    }

    /// Parent, grandparent, ... up to the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.nodes[id.0].parent,
        }
    }

    /// True when `candidate` is `id` itself or lies above it.
    pub fn is_ancestor(&self, candidate: NodeId, id: NodeId) -> bool {
        candidate == id || self.ancestors(id).any(|a| a == candidate)
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    pub fn root_of(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Nodes without a parent, in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids().filter(|id| self.nodes[id.0].parent.is_none())
    }

    /// Pre-order walk of the subtree at `id`, siblings in attachment order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            order.push(next);
            stack.extend(self.nodes[next.0].children.iter().rev().map(|link| link.node));
        }
        order
    }

    /// Name used in diagnostics: the node name, else the table source.
    pub fn label(&self, id: NodeId) -> String {
        self.nodes[id.0].display_name().to_string()
    }
}

pub struct Ancestors<'a> {
    tree: &'a BomTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.nodes[current.0].parent;
        Some(current)
    }
}
