//! multibom Property-Based Tests
//!
//! Properties of classification, flattening and supplier grouping over
//! generated part lists.

use multibom_models::{BomTree, CellValue, ColumnNames, NodeId, PartTable};
use multibom_utils::{Flattener, ProjectLoader};
use proptest::prelude::*;
use std::collections::HashMap;

fn table(source: &str, rows: &[(String, u32, String)]) -> PartTable {
    PartTable::from_sheet(
        source,
        vec!["PN".into(), "QTY".into(), "Supplier".into()],
        rows.iter()
            .map(|(pn, qty, supplier)| {
                vec![
                    CellValue::from_text(pn),
                    CellValue::Number(f64::from(*qty)),
                    CellValue::from_text(supplier),
                ]
            })
            .collect(),
        &ColumnNames::default(),
    )
    .unwrap()
}

fn row_strategy() -> impl Strategy<Value = (String, u32, String)> {
    (
        "P[0-9]{1,2}",
        1u32..50,
        prop::sample::select(vec!["", "Acme", "Globex", "Initech"]).prop_map(String::from),
    )
}

// ===== Classification =====

mod classification_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Classification succeeds exactly when one file carries a master name.
        #[test]
        fn prop_exactly_one_master(
            others in prop::collection::btree_set("[a-z]{3,8}", 0..6),
            masters in prop::sample::subsequence(vec!["master", "Parts List", "PARTS_LIST"], 0..=3),
        ) {
            let mut files: Vec<String> = others
                .iter()
                .filter(|f| !["master", "parts list", "parts_list"].contains(&f.as_str()))
                .map(|f| format!("{}.xlsx", f))
                .collect();
            files.extend(masters.iter().map(|m| format!("{}.xlsx", m)));
            files.sort();

            let result = ProjectLoader::default().classify(&files);
            if masters.len() == 1 {
                let classification = result.unwrap();
                prop_assert_eq!(classification.master, format!("{}.xlsx", masters[0]));
                prop_assert_eq!(classification.subassemblies.len(), files.len() - 1);
            } else {
                let err = result.unwrap_err();
                prop_assert_eq!(err.exit_code(), 2);
            }
        }
    }
}

// ===== Flattening =====

mod flattening_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A lone table flattens to the per-part sums of its own rows.
        #[test]
        fn prop_single_table_sums(rows in prop::collection::vec(row_strategy(), 1..30)) {
            let mut tree = BomTree::new();
            let root = tree.add_node(table("master.csv", &rows), None);
            let bom = Flattener::new(&tree).flatten(root).unwrap();

            let mut expected: HashMap<&str, u64> = HashMap::new();
            for (pn, qty, _) in &rows {
                *expected.entry(pn.as_str()).or_default() += u64::from(*qty);
            }
            prop_assert_eq!(bom.len(), expected.len());
            for (pn, total) in expected {
                prop_assert_eq!(bom.quantity(pn), Some(total));
            }
        }

        /// Quantities multiply down a chain of sub-assemblies.
        #[test]
        fn prop_multipliers_compound(
            multipliers in prop::collection::vec(1u32..12, 1..5),
            leaf_qty in 1u32..20,
        ) {
            let mut tree = BomTree::new();
            let mut parent: Option<NodeId> = None;
            let mut root = None;
            for (depth, m) in multipliers.iter().enumerate() {
                let rows = vec![(format!("SUB{}", depth + 1), *m, String::new())];
                let t = table(&format!("SUB{}.csv", depth), &rows);
                let id = match parent {
                    None => tree.add_node(t, None),
                    Some(p) => tree.add_child(p, 0, t, None).unwrap(),
                };
                root.get_or_insert(id);
                parent = Some(id);
            }
            let leaf = table("leaf.csv", &[("LEAF".to_string(), leaf_qty, String::new())]);
            tree.add_child(parent.unwrap(), 0, leaf, None).unwrap();

            let bom = Flattener::new(&tree).flatten(root.unwrap()).unwrap();
            let expected: u64 = multipliers.iter().map(|m| u64::from(*m)).product::<u64>() * u64::from(leaf_qty);
            prop_assert_eq!(bom.quantity("LEAF"), Some(expected));
            prop_assert_eq!(bom.len(), 1);
        }

        /// Supplier groups partition the flattened totals.
        #[test]
        fn prop_supplier_groups_partition_totals(
            master_rows in prop::collection::vec(row_strategy(), 1..15),
            sub_rows in prop::collection::vec(row_strategy(), 1..15),
            sub_qty in 1u32..10,
        ) {
            let mut rows = master_rows;
            rows.insert(0, ("ASSY".to_string(), sub_qty, String::new()));

            let mut tree = BomTree::new();
            let root = tree.add_node(table("master.csv", &rows), None);
            tree.add_child(root, 0, table("ASSY.csv", &sub_rows), None).unwrap();

            let flattener = Flattener::new(&tree);
            let bom = flattener.flatten(root).unwrap();
            let groups = flattener.by_supplier(root).unwrap();

            for (pn, total) in bom.quantities() {
                let split: u64 = groups.iter().filter_map(|(_, g)| g.quantity(&pn)).sum();
                prop_assert_eq!(split, total);
            }
            let grouped_parts: usize = groups.iter().map(|(_, g)| g.len()).sum();
            prop_assert!(grouped_parts >= bom.len());
        }
    }
}
