//! Formula evaluation.
//!
//! Reduces an [`Ast`] to a number against a read-only view of cell values.
//! Evaluation never touches the spreadsheet itself.

use super::cell_id::CellId;
use super::resolve::Resolver;
use crate::error::Result;
use crate::formula::{Ast, UnaryOp};

/// Evaluate `ast` as the formula of cell `base`.
///
/// `value_of` supplies the current value of any cell; it should return 0
/// for cells that do not exist.
pub fn evaluate<F>(resolver: &Resolver, base: &CellId, ast: &Ast, value_of: &F) -> Result<f64>
where
    F: Fn(&CellId) -> f64,
{
    match ast {
        Ast::Num(n) => Ok(*n),
        Ast::Ref(r) => Ok(value_of(&resolver.resolve(base, r)?)),
        Ast::Unary {
            op: UnaryOp::Neg,
            operand,
        } => Ok(-evaluate(resolver, base, operand, value_of)?),
        Ast::Binary { op, lhs, rhs } => {
            let lhs = evaluate(resolver, base, lhs, value_of)?;
            let rhs = evaluate(resolver, base, rhs, value_of)?;
            Ok(op.apply(lhs, rhs))
        }
    }
}

/// Every cell `ast` reads when homed at `base`, without duplicates, in
/// order of first appearance.
pub fn direct_refs(resolver: &Resolver, base: &CellId, ast: &Ast) -> Result<Vec<CellId>> {
    let mut refs: Vec<CellId> = Vec::new();
    let mut failure = None;
    ast.for_each_ref(&mut |r| {
        if failure.is_some() {
            return;
        }
        match resolver.resolve(base, r) {
            Ok(id) => {
                if !refs.contains(&id) {
                    refs.push(id);
                }
            }
            Err(e) => failure = Some(e),
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(refs),
    }
}
