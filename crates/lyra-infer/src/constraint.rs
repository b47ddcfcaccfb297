//! Constraint formulas and reduction outcomes.

use serde::{Deserialize, Serialize};

use lyra_types::TyId;

use crate::expr::ExprId;

/// The relation a constraint asserts between its left and right side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    Same,
    Subtype,
    Compatible,
    /// Coarse arity/shape pre-check used to discard impossible overload
    /// candidates before real reduction.
    PotentiallyCompatible,
}

/// `⟨left rel right⟩` over two types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeConstraint {
    pub left: TyId,
    pub relation: Relation,
    pub right: TyId,
}

/// A constraint formula. Each formula is consumed exactly once by
/// [`crate::reduce`]; replacement formulas are fresh values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constraint {
    /// `⟨expression → type⟩`
    Expr {
        expr: ExprId,
        relation: Relation,
        target: TyId,
    },
    /// `⟨type rel type⟩`
    Type(TypeConstraint),
}

impl Constraint {
    pub fn expr(expr: ExprId, relation: Relation, target: TyId) -> Self {
        Constraint::Expr {
            expr,
            relation,
            target,
        }
    }

    pub fn types(left: TyId, relation: Relation, right: TyId) -> Self {
        Constraint::Type(TypeConstraint {
            left,
            relation,
            right,
        })
    }
}

/// Result of reducing one constraint formula.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reduction {
    True,
    False,
    /// An inference placeholder blocks a definitive answer; retry once more
    /// information is available. Distinct from both `True` and `False`.
    Uncertain,
    /// The formula rewrote into sub-formulas for the caller to feed back.
    Replace(Vec<Constraint>),
    /// Reduction already mutated the ambient bound set; nothing remains.
    Absorbed,
}

impl Reduction {
    pub fn from_bool(value: bool) -> Self {
        if value {
            Reduction::True
        } else {
            Reduction::False
        }
    }
}
