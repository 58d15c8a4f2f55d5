// Property-based tests for the spreadsheet's consistency guarantees.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashSet;

use proptest::prelude::*;
use sheetcalc_engine::engine::{CellId, Spreadsheet, direct_refs, evaluate};

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
enum Op {
    Set(String, String),
    Remove(String),
    Copy(String, String),
}

/// A cell in a 3x3 corner of the grid, so edits collide often.
fn arb_cell() -> impl Strategy<Value = String> {
    (0usize..3, 1usize..4).prop_map(|(col, row)| format!("{}{}", (b'a' + col as u8) as char, row))
}

fn arb_formula() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        2 => arb_cell(),
        1 => (0u32..20).prop_map(|n| n.to_string()),
    ];
    leaf.prop_recursive(3, 12, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a} + {b}")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("({a}) - {b}")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a} * ({b})")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a} / {b}")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("max({a}, {b})")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("min({a}, {b})")),
            inner.prop_map(|a| format!("-({a})")),
        ]
    })
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (arb_cell(), arb_formula()).prop_map(|(c, f)| Op::Set(c, f)),
        2 => arb_cell().prop_map(Op::Remove),
        1 => (arb_cell(), arb_cell()).prop_map(|(d, s)| Op::Copy(d, s)),
    ]
}

fn apply(sheet: &mut Spreadsheet, op: &Op) -> Result<Vec<(CellId, f64)>, String> {
    let result = match op {
        Op::Set(cell, formula) => sheet.set_cell(cell, formula),
        Op::Remove(cell) => sheet.remove_cell(cell),
        Op::Copy(dest, src) => sheet.copy_cell(dest, src),
    };
    result
        .map(|u| u.into_iter().collect())
        .map_err(|e| e.kind().code().to_string())
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

fn same_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// Everything observable about the sheet, in a stable order.
fn snapshot(sheet: &Spreadsheet) -> String {
    let mut cells: Vec<_> = sheet
        .cells()
        .map(|(id, cell)| {
            (
                *id,
                cell.formula.clone(),
                format!("{:?}", cell.value),
                sheet.precedents(id).to_vec(),
                sheet.dependents(id).to_vec(),
            )
        })
        .collect();
    cells.sort_by_key(|c| c.0);
    format!("{cells:?}")
}

fn assert_acyclic(sheet: &Spreadsheet) {
    for (start, _) in sheet.cells() {
        let mut seen = HashSet::new();
        let mut stack: Vec<CellId> = sheet.dependents(start).to_vec();
        while let Some(id) = stack.pop() {
            assert_ne!(id, *start, "cycle through {start}");
            if seen.insert(id) {
                stack.extend_from_slice(sheet.dependents(&id));
            }
        }
    }
}

fn assert_closed(sheet: &Spreadsheet) {
    for (id, cell) in sheet.cells() {
        let expected: HashSet<CellId> = match &cell.ast {
            Some(ast) => direct_refs(sheet.resolver(), id, ast)
                .unwrap()
                .into_iter()
                .collect(),
            None => HashSet::new(),
        };
        let actual: HashSet<CellId> = sheet.precedents(id).iter().copied().collect();
        assert_eq!(actual, expected, "precedents of {id}");
        for p in &actual {
            assert!(sheet.cell(p).is_some(), "{id} reads missing cell {p}");
            assert!(sheet.dependents(p).contains(id), "edge {p} -> {id} one-sided");
        }
    }
}

fn assert_fresh(sheet: &Spreadsheet) {
    for (id, cell) in sheet.cells() {
        let expected = match &cell.ast {
            Some(ast) => evaluate(sheet.resolver(), id, ast, &|c: &CellId| sheet.value(c)).unwrap(),
            None => 0.0,
        };
        assert!(
            same_value(cell.value, expected),
            "{id} holds {} but evaluates to {expected}",
            cell.value
        );
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config())]

    #[test]
    fn graph_stays_acyclic_closed_and_fresh(ops in prop::collection::vec(arb_op(), 1..40)) {
        let mut sheet = Spreadsheet::new("prop");
        for op in &ops {
            let before = snapshot(&sheet);
            if apply(&mut sheet, op).is_err() {
                prop_assert_eq!(snapshot(&sheet), before, "failed {:?} changed the sheet", op);
            }
            assert_acyclic(&sheet);
            assert_closed(&sheet);
            assert_fresh(&sheet);
        }
    }

    #[test]
    fn updates_match_changed_values(ops in prop::collection::vec(arb_op(), 1..30)) {
        let mut sheet = Spreadsheet::new("prop");
        for op in &ops {
            if let Ok(updates) = apply(&mut sheet, op) {
                for (id, value) in updates {
                    prop_assert!(same_value(sheet.value(&id), value), "{} reported {}", id, value);
                }
            }
        }
    }

    #[test]
    fn same_ops_same_outcome(ops in prop::collection::vec(arb_op(), 1..30)) {
        let mut first = Spreadsheet::new("one");
        let mut second = Spreadsheet::new("two");
        for op in &ops {
            let a = format!("{:?}", apply(&mut first, op));
            let b = format!("{:?}", apply(&mut second, op));
            prop_assert_eq!(a, b);
        }
        prop_assert_eq!(snapshot(&first), snapshot(&second));
        prop_assert_eq!(format!("{:?}", first.dump_with_values()), format!("{:?}", second.dump_with_values()));
    }

    #[test]
    fn dump_rebuilds_the_sheet(ops in prop::collection::vec(arb_op(), 1..30)) {
        let mut sheet = Spreadsheet::new("prop");
        for op in &ops {
            let _ = apply(&mut sheet, op);
        }
        let mut replay = Spreadsheet::new("replay");
        for (id, formula) in sheet.dump() {
            prop_assert!(replay.set_cell(&id.to_string(), &formula).is_ok());
        }
        let original: Vec<_> = sheet.dump_with_values().into_iter().map(|(i, f, v)| (i, f, format!("{v:?}"))).collect();
        let rebuilt: Vec<_> = replay.dump_with_values().into_iter().map(|(i, f, v)| (i, f, format!("{v:?}"))).collect();
        prop_assert_eq!(original, rebuilt);
    }
}
