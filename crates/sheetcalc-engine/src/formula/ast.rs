//! Formula syntax tree.
//!
//! References are stored relative to the formula's home cell so the same
//! tree can be re-homed by copy/paste. A `$` part of a reference is stored
//! as an absolute coordinate and does not move.

use crate::engine::{CellId, Resolver};
use crate::error::Result;

/// One coordinate of a reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Coord {
    /// Offset from the home cell's coordinate.
    Relative(isize),
    /// Fixed 0-indexed coordinate (`$` form).
    Absolute(usize),
}

impl Coord {
    /// Position this coordinate denotes for a home coordinate `base`.
    /// May be negative; bounds are checked by the resolver.
    /// Saturates rather than wrapping, so an unreachable coordinate always
    /// stays outside any grid.
    pub fn apply(self, base: usize) -> isize {
        match self {
            Coord::Relative(delta) => signed(base).saturating_add(delta),
            Coord::Absolute(index) => signed(index),
        }
    }

    pub fn is_absolute(self) -> bool {
        matches!(self, Coord::Absolute(_))
    }
}

/// A grid coordinate as a signed offset base, clamped to `isize::MAX`.
pub(crate) fn signed(index: usize) -> isize {
    isize::try_from(index).unwrap_or(isize::MAX)
}

/// A reference to another cell as it appears inside a formula.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub col: Coord,
    pub row: Coord,
}

impl CellRef {
    /// Fully relative reference, `delta_col` columns and `delta_row` rows away.
    pub fn relative(delta_col: isize, delta_row: isize) -> CellRef {
        CellRef {
            col: Coord::Relative(delta_col),
            row: Coord::Relative(delta_row),
        }
    }

    /// Reference to `target` written in a formula homed at `base`.
    pub fn to_target(base: &CellId, target: &CellId, col_abs: bool, row_abs: bool) -> CellRef {
        let col = if col_abs {
            Coord::Absolute(target.col)
        } else {
            Coord::Relative(signed(target.col).saturating_sub(signed(base.col)))
        };
        let row = if row_abs {
            Coord::Absolute(target.row)
        } else {
            Coord::Relative(signed(target.row).saturating_sub(signed(base.row)))
        };
        CellRef { col, row }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
}

impl BinaryOp {
    /// Apply the operator. Division follows IEEE-754, so dividing by zero
    /// yields an infinity or NaN rather than an error.
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
            BinaryOp::Min => lhs.min(rhs),
            BinaryOp::Max => lhs.max(rhs),
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Min => "min",
            BinaryOp::Max => "max",
        }
    }

    fn is_call(self) -> bool {
        matches!(self, BinaryOp::Min | BinaryOp::Max)
    }
}

/// A parsed formula.
#[derive(Clone, Debug, PartialEq)]
pub enum Ast {
    Num(f64),
    Ref(CellRef),
    Unary { op: UnaryOp, operand: Box<Ast> },
    Binary { op: BinaryOp, lhs: Box<Ast>, rhs: Box<Ast> },
}

const PREC_ADD: u8 = 1;
const PREC_MUL: u8 = 2;
const PREC_UNARY: u8 = 3;
const PREC_ATOM: u8 = 4;

impl Ast {
    pub fn neg(operand: Ast) -> Ast {
        Ast::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Ast, rhs: Ast) -> Ast {
        Ast::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Visit every reference node, left to right.
    pub fn for_each_ref(&self, f: &mut impl FnMut(&CellRef)) {
        match self {
            Ast::Num(_) => {}
            Ast::Ref(r) => f(r),
            Ast::Unary { operand, .. } => operand.for_each_ref(f),
            Ast::Binary { lhs, rhs, .. } => {
                lhs.for_each_ref(f);
                rhs.for_each_ref(f);
            }
        }
    }

    /// Render this formula as text for a formula homed at `base`.
    /// Fails if a reference would land outside the grid.
    pub fn to_formula(&self, base: &CellId, resolver: &Resolver) -> Result<String> {
        let mut out = String::new();
        self.write_formula(base, resolver, &mut out)?;
        Ok(out)
    }

    fn precedence(&self) -> u8 {
        match self {
            Ast::Num(n) if *n < 0.0 => PREC_UNARY,
            Ast::Num(_) | Ast::Ref(_) => PREC_ATOM,
            Ast::Unary { .. } => PREC_UNARY,
            Ast::Binary { op, .. } => match op {
                BinaryOp::Add | BinaryOp::Sub => PREC_ADD,
                BinaryOp::Mul | BinaryOp::Div => PREC_MUL,
                BinaryOp::Min | BinaryOp::Max => PREC_ATOM,
            },
        }
    }

    fn write_formula(&self, base: &CellId, resolver: &Resolver, out: &mut String) -> Result<()> {
        match self {
            // An overflowing literal such as `1e400` must render as text that
            // parses back to infinity.
            Ast::Num(n) if n.is_infinite() => {
                out.push_str(if *n > 0.0 { "1e999" } else { "-1e999" })
            }
            Ast::Num(n) => out.push_str(&n.to_string()),
            Ast::Ref(r) => {
                let target = resolver.resolve(base, r)?;
                if r.col.is_absolute() {
                    out.push('$');
                }
                out.push_str(&CellId::col_to_letters(target.col));
                if r.row.is_absolute() {
                    out.push('$');
                }
                out.push_str(&(target.row + 1).to_string());
            }
            Ast::Unary { op: UnaryOp::Neg, operand } => {
                out.push('-');
                operand.write_operand(operand.precedence() < PREC_UNARY, base, resolver, out)?;
            }
            Ast::Binary { op, lhs, rhs } if op.is_call() => {
                out.push_str(op.symbol());
                out.push('(');
                lhs.write_formula(base, resolver, out)?;
                out.push_str(", ");
                rhs.write_formula(base, resolver, out)?;
                out.push(')');
            }
            Ast::Binary { op, lhs, rhs } => {
                let prec = self.precedence();
                lhs.write_operand(lhs.precedence() < prec, base, resolver, out)?;
                out.push(' ');
                out.push_str(op.symbol());
                out.push(' ');
                // Equal precedence on the right keeps its parentheses so the
                // rendered text parses back to the same tree.
                rhs.write_operand(rhs.precedence() <= prec, base, resolver, out)?;
            }
        }
        Ok(())
    }

    fn write_operand(
        &self,
        parenthesize: bool,
        base: &CellId,
        resolver: &Resolver,
        out: &mut String,
    ) -> Result<()> {
        if parenthesize {
            out.push('(');
            self.write_formula(base, resolver, out)?;
            out.push(')');
        } else {
            self.write_formula(base, resolver, out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GridBounds;

    fn resolver() -> Resolver {
        Resolver::new(GridBounds::default())
    }

    #[test]
    fn test_coord_apply() {
        assert_eq!(Coord::Relative(-2).apply(1), -1);
        assert_eq!(Coord::Relative(3).apply(1), 4);
        assert_eq!(Coord::Absolute(7).apply(1), 7);
    }

    #[test]
    fn test_to_target_round_trips() {
        let base = CellId::new(2, 5);
        let target = CellId::new(0, 1);
        let r = CellRef::to_target(&base, &target, false, true);
        assert_eq!(r.col, Coord::Relative(-2));
        assert_eq!(r.row, Coord::Absolute(1));
        assert_eq!(resolver().resolve(&base, &r).unwrap(), target);
    }

    #[test]
    fn test_render_keeps_structure() {
        // a1 - (b1 - 2) * -c1
        let ast = Ast::binary(
            BinaryOp::Sub,
            Ast::Ref(CellRef::relative(-1, 0)),
            Ast::binary(
                BinaryOp::Mul,
                Ast::binary(BinaryOp::Sub, Ast::Ref(CellRef::relative(0, 0)), Ast::Num(2.0)),
                Ast::neg(Ast::Ref(CellRef::relative(1, 0))),
            ),
        );
        let text = ast.to_formula(&CellId::new(1, 0), &resolver()).unwrap();
        assert_eq!(text, "a1 - (b1 - 2) * -c1");
    }

    #[test]
    fn test_render_right_associative_grouping() {
        let ast = Ast::binary(
            BinaryOp::Div,
            Ast::Num(8.0),
            Ast::binary(BinaryOp::Div, Ast::Num(4.0), Ast::Num(2.0)),
        );
        let text = ast.to_formula(&CellId::new(0, 0), &resolver()).unwrap();
        assert_eq!(text, "8 / (4 / 2)");
    }

    #[test]
    fn test_render_function_and_absolute_refs() {
        let base = CellId::new(1, 1);
        let ast = Ast::binary(
            BinaryOp::Max,
            Ast::Ref(CellRef::to_target(&base, &CellId::new(0, 0), true, true)),
            Ast::Ref(CellRef::to_target(&base, &CellId::new(0, 1), false, true)),
        );
        let text = ast.to_formula(&base, &resolver()).unwrap();
        assert_eq!(text, "max($a$1, a$2)");
    }

    #[test]
    fn test_render_out_of_grid_fails() {
        let ast = Ast::Ref(CellRef::relative(-1, 0));
        let err = ast.to_formula(&CellId::new(0, 0), &resolver()).unwrap_err();
        assert_eq!(err.kind().code(), "REF_OUT_OF_RANGE");
    }

    #[test]
    fn test_render_overflowing_literal() {
        let base = CellId::new(0, 0);
        let ast = crate::formula::parse("1e400 + 1", &base).unwrap();
        let text = ast.to_formula(&base, &resolver()).unwrap();
        assert_eq!(text, "1e999 + 1");
        assert_eq!(crate::formula::parse(&text, &base).unwrap(), ast);
    }
}
