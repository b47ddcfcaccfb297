//! Interface to the surrounding inference session and the suspend/resume
//! discipline for nested poly invocations.

use std::collections::HashMap;

use thiserror::Error;

use lyra_types::{MethodSignature, TyId, TypeStore, TypeVarId};

use crate::constraint::TypeConstraint;
use crate::expr::{ExprId, PolySite};

/// Hard failures that abort reduction of the current formula. At a nested
/// poly-invocation boundary they collapse to a structural mismatch rather
/// than propagating further out.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InferenceFailure {
    /// A value was demanded of an expression that produces none, e.g. a
    /// `void` invocation in value position.
    #[error("expression has no value in this context")]
    ValuelessExpression,
    /// Bound incorporation derived contradictory bounds for a variable.
    #[error("contradictory bounds for an inference variable")]
    ContradictoryBounds,
}

/// What `enter_poly_invocation` hands back: enough to restore the outer
/// inference context when the nested one finishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SuspensionRecord {
    pub site: PolySite,
    pub token: u64,
}

/// Invocation arguments as the session wants them: source expressions when
/// the call site is in hand, already-known types otherwise.
#[derive(Clone, Copy, Debug)]
pub enum Arguments<'a> {
    Exprs(&'a [ExprId]),
    Types(&'a [TyId]),
}

/// The inference session reduction runs inside. Reduction only consumes
/// this; the solver that owns bound sets and resolution order implements it.
pub trait InferenceSession {
    /// Fresh inference variables for a list of type parameters, returned in
    /// declaration order.
    fn create_placeholders(&mut self, store: &mut TypeStore, type_params: &[TypeVarId])
        -> Vec<TyId>;

    /// Seed the constraint set from a method's formal parameters against the
    /// actual arguments.
    fn add_parameter_constraints(
        &mut self,
        store: &mut TypeStore,
        method: &MethodSignature,
        args: Arguments<'_>,
        varargs: bool,
    ) -> Result<(), InferenceFailure>;

    /// Seed constraints from a contract's `throws` clause against the
    /// exceptions a lambda body or referenced method can raise.
    fn add_throws_constraints(
        &mut self,
        store: &mut TypeStore,
        contract: &MethodSignature,
        site: PolySite,
    ) -> Result<(), InferenceFailure>;

    /// Feed one type constraint into the bound set and run reduction and
    /// incorporation to a fixed point. `false` means the bound set became
    /// contradictory.
    fn reduce_and_incorporate(
        &mut self,
        store: &mut TypeStore,
        constraint: TypeConstraint,
    ) -> Result<bool, InferenceFailure>;

    /// Apply the current (possibly partial) instantiation to a type.
    fn substitute(&mut self, store: &mut TypeStore, ty: TyId) -> TyId;

    /// Resolve every remaining variable reachable from `ty`, yielding the
    /// full instantiation map.
    fn solve(
        &mut self,
        store: &mut TypeStore,
        ty: TyId,
    ) -> Result<HashMap<TyId, TyId>, InferenceFailure>;

    /// Suspend the current inference context and open a nested one for the
    /// poly invocation at `site`.
    fn enter_poly_invocation(&mut self, site: PolySite) -> SuspensionRecord;

    /// Close the nested context opened by `enter_poly_invocation` and
    /// restore the suspended one.
    fn resume(&mut self, record: SuspensionRecord);

    /// Fold the bounds gathered in a finished nested context into the
    /// enclosing one.
    fn integrate_inner_bounds(&mut self, store: &mut TypeStore, site: PolySite);

    /// Whether reduction is currently running inside a lambda body whose
    /// contract is itself still being inferred.
    fn in_nested_lambda_inference(&self) -> bool {
        false
    }
}

/// Guard pairing `enter_poly_invocation` with `resume`. Resumption happens
/// on drop, so every exit path out of a nested reduction, including `?`,
/// restores the outer context.
pub struct PolyScope<'a> {
    session: &'a mut dyn InferenceSession,
    record: Option<SuspensionRecord>,
}

impl<'a> PolyScope<'a> {
    pub fn enter(session: &'a mut dyn InferenceSession, site: PolySite) -> Self {
        let record = session.enter_poly_invocation(site);
        Self {
            session,
            record: Some(record),
        }
    }

    pub fn session(&mut self) -> &mut dyn InferenceSession {
        self.session
    }
}

impl Drop for PolyScope<'_> {
    fn drop(&mut self) {
        if let Some(record) = self.record.take() {
            self.session.resume(record);
        }
    }
}
