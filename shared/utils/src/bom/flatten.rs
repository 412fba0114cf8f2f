//! BOM Flattener
//!
//! Walks an assembly tree top-down, multiplying every row's quantity by the
//! quantities of the rows that led to it, and aggregates the elemental parts.
//!
//! Totals are accumulated as `f64`. The reported count for a part is rounded
//! up to the next whole unit once, after aggregation, because fractional
//! parts cannot be ordered (see [`multibom_models::round_up_quantity`]).

use multibom_models::{
    BomError, BomResult, BomTree, CellValue, FlattenedBom, NodeId, PartRow, PartTable,
    SupplierBoms, UNSPECIFIED_SUPPLIER,
};
use std::collections::HashSet;

/// Derives flattened part lists from a [`BomTree`].
pub struct Flattener<'a> {
    tree: &'a BomTree,
}

impl<'a> Flattener<'a> {
    pub fn new(tree: &'a BomTree) -> Self {
        Self { tree }
    }

    /// Total quantity of every elemental part below `root`.
    pub fn flatten(&self, root: NodeId) -> BomResult<FlattenedBom> {
        let mut bom = FlattenedBom::new(self.quantity_field(root));
        for field in self.output_fields(root) {
            bom.add_field(&field);
        }

        self.walk(root, &mut |table: &PartTable, row: &PartRow, quantity: f64| {
            bom.add(&row.part_number, quantity, attributes(table, row));
        })?;

        tracing::debug!(parts = bom.len(), "Flattened BOM");
        Ok(bom)
    }

    /// Same walk as [`Self::flatten`], partitioned by the supplier column.
    ///
    /// A part bought from two suppliers appears once under each.
    ///
    /// Each group is rounded up on its own, so the group counts of a part add
    /// up to its flattened count only when the quantities are whole numbers.
    /// With fractional quantities every supplier is asked for at least one
    /// whole unit and the sum can exceed the flattened count.
    pub fn by_supplier(&self, root: NodeId) -> BomResult<SupplierBoms> {
        let quantity_field = self.quantity_field(root);
        let mut groups = SupplierBoms::new();

        self.walk(root, &mut |table: &PartTable, row: &PartRow, quantity: f64| {
            let supplier = table
                .supplier(row)
                .unwrap_or_else(|| UNSPECIFIED_SUPPLIER.to_string());
            groups
                .entry(&supplier, &quantity_field)
                .add(&row.part_number, quantity, attributes(table, row));
        })?;

        groups.set_fields(&self.output_fields(root));
        tracing::debug!(suppliers = groups.len(), "Grouped BOM by supplier");
        Ok(groups)
    }

    fn quantity_field(&self, root: NodeId) -> String {
        self.tree.node(root).table().quantity_field().to_string()
    }

    /// Columns of every table below `root` in first-seen order, minus the
    /// reference column used only for linking.
    fn output_fields(&self, root: NodeId) -> Vec<String> {
        let mut fields: Vec<String> = Vec::new();
        for id in self.tree.descendants(root) {
            let table = self.tree.node(id).table();
            for field in table.fields() {
                if field.is_empty() || Some(field.as_str()) == table.link_field() {
                    continue;
                }
                if !fields.iter().any(|f| f.eq_ignore_ascii_case(field)) {
                    fields.push(field.clone());
                }
            }
        }
        fields
    }

    /// Pre-order walk calling `visit` for every elemental row with its
    /// multiplied quantity.
    fn walk<F>(&self, root: NodeId, visit: &mut F) -> BomResult<()>
    where
        F: FnMut(&PartTable, &PartRow, f64),
    {
        let mut visited = HashSet::new();
        self.walk_node(root, 1.0, &mut visited, visit)
    }

    fn walk_node<F>(
        &self,
        id: NodeId,
        multiplier: f64,
        visited: &mut HashSet<NodeId>,
        visit: &mut F,
    ) -> BomResult<()>
    where
        F: FnMut(&PartTable, &PartRow, f64),
    {
        if !visited.insert(id) {
            let label = self.tree.label(id);
            let parent = self
                .tree
                .parent(id)
                .map(|p| self.tree.label(p))
                .unwrap_or_default();
            return Err(BomError::structural(
                label.clone(),
                vec![parent, label],
                "sub-assembly reached twice while flattening",
            ));
        }

        let node = self.tree.node(id);
        let table = node.table();
        for (idx, row) in table.rows().iter().enumerate() {
            match node.child_for_row(idx) {
                Some(link) => self.walk_node(link.node, multiplier * link.multiplier, visited, visit)?,
                None => visit(table, row, multiplier * row.quantity),
            }
        }
        Ok(())
    }
}

fn attributes(table: &PartTable, row: &PartRow) -> Vec<(String, CellValue)> {
    let link_field = table.link_field();
    table
        .fields()
        .iter()
        .zip(row.cells.iter())
        .filter(|(field, _)| Some(field.as_str()) != link_field)
        .map(|(field, cell)| (field.clone(), cell.clone()))
        .collect()
}
