use std::collections::HashMap;

use pretty_assertions::assert_eq;

use lyra_infer::{
    input_variables, potentially_compatible, reduce, Arguments, Body, Conditional, Constraint,
    Expr, ExprId, ExprResolver, InferenceFailure, InferenceSession, Invocation, Lambda, MethodRef,
    MethodRefKind, PolySite, Reduction, Relation, Standalone, SuspensionRecord, TypeConstraint,
};
use lyra_types::{
    collect_inference_vars, is_compatible, is_proper, ClassDef, ClassKind, InfVarId, MethodDef,
    MethodFlags, MethodSignature, PrimitiveType, TyId, TypeStore, TypeVarId, WildcardKind,
};

#[derive(Default)]
struct FakeSession {
    next_var: u32,
    active: Vec<PolySite>,
    next_token: u64,
    events: Vec<String>,
    poison_incorporation: bool,
}

impl InferenceSession for FakeSession {
    fn create_placeholders(
        &mut self,
        store: &mut TypeStore,
        type_params: &[TypeVarId],
    ) -> Vec<TyId> {
        type_params
            .iter()
            .map(|_| {
                let var = store.inference_var(InfVarId(self.next_var));
                self.next_var += 1;
                var
            })
            .collect()
    }

    fn add_parameter_constraints(
        &mut self,
        _store: &mut TypeStore,
        method: &MethodSignature,
        args: Arguments<'_>,
        _varargs: bool,
    ) -> Result<(), InferenceFailure> {
        let count = match args {
            Arguments::Exprs(exprs) => exprs.len(),
            Arguments::Types(types) => types.len(),
        };
        self.events.push(format!("params:{}:{count}", method.name));
        Ok(())
    }

    fn add_throws_constraints(
        &mut self,
        _store: &mut TypeStore,
        contract: &MethodSignature,
        _site: PolySite,
    ) -> Result<(), InferenceFailure> {
        self.events.push(format!("throws:{}", contract.name));
        Ok(())
    }

    fn reduce_and_incorporate(
        &mut self,
        store: &mut TypeStore,
        constraint: TypeConstraint,
    ) -> Result<bool, InferenceFailure> {
        self.events.push("incorporate".to_string());
        if self.poison_incorporation {
            return Err(InferenceFailure::ContradictoryBounds);
        }
        if is_proper(store, constraint.left) && is_proper(store, constraint.right) {
            return Ok(is_compatible(store, constraint.left, constraint.right));
        }
        Ok(true)
    }

    fn substitute(&mut self, _store: &mut TypeStore, ty: TyId) -> TyId {
        ty
    }

    fn solve(
        &mut self,
        store: &mut TypeStore,
        ty: TyId,
    ) -> Result<HashMap<TyId, TyId>, InferenceFailure> {
        let mut vars = Vec::new();
        collect_inference_vars(store, ty, &mut vars);
        let object = store.object_ty();
        Ok(vars.into_iter().map(|v| (v, object)).collect())
    }

    fn enter_poly_invocation(&mut self, site: PolySite) -> SuspensionRecord {
        self.next_token += 1;
        self.active.push(site);
        SuspensionRecord {
            site,
            token: self.next_token,
        }
    }

    fn resume(&mut self, record: SuspensionRecord) {
        assert_eq!(self.active.pop(), Some(record.site));
    }

    fn integrate_inner_bounds(&mut self, _store: &mut TypeStore, site: PolySite) {
        self.events.push(format!("integrate:{}", site.0));
    }
}

#[derive(Default)]
struct FakeResolver {
    lambda_ok: bool,
    body_resolutions: u32,
    method_ref: Option<MethodSignature>,
}

impl ExprResolver for FakeResolver {
    fn shallow_original(&self, _site: PolySite) -> Option<MethodSignature> {
        None
    }

    fn resolve_lambda_body(
        &mut self,
        _store: &mut TypeStore,
        _lambda: ExprId,
        _sam: &MethodSignature,
    ) -> bool {
        self.body_resolutions += 1;
        self.lambda_ok
    }

    fn resolve_method_ref(
        &mut self,
        _store: &mut TypeStore,
        _mref: ExprId,
        _target: TyId,
    ) -> Option<MethodSignature> {
        self.method_ref.clone()
    }
}

fn string_ty(store: &mut TypeStore) -> TyId {
    store.class_ty(store.well_known().string, vec![])
}

fn integer_ty(store: &mut TypeStore) -> TyId {
    store.class_ty(store.well_known().integer, vec![])
}

fn function_string_integer(store: &mut TypeStore) -> TyId {
    let function = store.well_known().function;
    let s = string_ty(store);
    let i = integer_ty(store);
    store.parameterized(function, vec![s, i], None)
}

#[test]
fn conditional_decomposes_into_one_formula_per_branch() {
    let mut store = TypeStore::with_minimal_jdk();
    let mut session = FakeSession::default();
    let mut resolver = FakeResolver::default();
    let target = string_ty(&mut store);

    let mut body = Body::new();
    let s = string_ty(&mut store);
    let then_expr = body.alloc(Expr::Standalone(Standalone::typed(s)));
    let else_expr = body.alloc(Expr::Standalone(Standalone::typed(s)));
    let cond = body.alloc(Expr::Conditional(Conditional {
        then_expr,
        else_expr,
    }));

    let constraint = Constraint::expr(cond, Relation::Compatible, target);
    let outcome = reduce(&mut store, &body, &mut session, &mut resolver, &constraint)
        .expect("no hard failure");
    assert_eq!(
        outcome,
        Reduction::Replace(vec![
            Constraint::expr(then_expr, Relation::Compatible, target),
            Constraint::expr(else_expr, Relation::Compatible, target),
        ])
    );
}

#[test]
fn lambda_arity_mismatch_is_false_without_consulting_the_body() {
    let mut store = TypeStore::with_minimal_jdk();
    let mut session = FakeSession::default();
    let mut resolver = FakeResolver {
        lambda_ok: true,
        ..FakeResolver::default()
    };
    let target = function_string_integer(&mut store);

    let mut body = Body::new();
    let lambda = body.alloc(Expr::Lambda(Lambda {
        site: PolySite(0),
        params: vec![None, None],
        void_compatible: false,
        value_compatible: true,
        results: vec![],
        ty: None,
    }));

    let constraint = Constraint::expr(lambda, Relation::Compatible, target);
    let outcome = reduce(&mut store, &body, &mut session, &mut resolver, &constraint)
        .expect("no hard failure");
    assert_eq!(outcome, Reduction::False);
    assert_eq!(resolver.body_resolutions, 0);
}

#[test]
fn elided_lambda_with_matching_arity_reduces_to_true() {
    let mut store = TypeStore::with_minimal_jdk();
    let mut session = FakeSession::default();
    let mut resolver = FakeResolver {
        lambda_ok: true,
        ..FakeResolver::default()
    };
    let target = function_string_integer(&mut store);

    let mut body = Body::new();
    let i = integer_ty(&mut store);
    let result = body.alloc(Expr::Standalone(Standalone::typed(i)));
    let lambda = body.alloc(Expr::Lambda(Lambda {
        site: PolySite(0),
        params: vec![None],
        void_compatible: false,
        value_compatible: true,
        results: vec![result],
        ty: None,
    }));

    let constraint = Constraint::expr(lambda, Relation::Compatible, target);
    let outcome = reduce(&mut store, &body, &mut session, &mut resolver, &constraint)
        .expect("no hard failure");
    // The single result is proper and assignable, so nothing is left over.
    assert_eq!(outcome, Reduction::True);
    assert_eq!(resolver.body_resolutions, 1);
}

#[test]
fn elided_lambda_grounds_a_wildcard_target_structurally() {
    let mut store = TypeStore::with_minimal_jdk();
    let mut session = FakeSession::default();
    let mut resolver = FakeResolver {
        lambda_ok: true,
        ..FakeResolver::default()
    };
    let consumer = store.well_known().consumer;
    let s = string_ty(&mut store);
    let wildcard = store.wildcard(consumer, 0, WildcardKind::Super, Some(s), vec![]);
    let target = store.parameterized(consumer, vec![wildcard], None);

    let mut body = Body::new();
    let lambda = body.alloc(Expr::Lambda(Lambda {
        site: PolySite(0),
        params: vec![None],
        void_compatible: true,
        value_compatible: true,
        results: vec![],
        ty: None,
    }));

    let constraint = Constraint::expr(lambda, Relation::Compatible, target);
    let outcome = reduce(&mut store, &body, &mut session, &mut resolver, &constraint)
        .expect("no hard failure");
    assert_eq!(outcome, Reduction::True);
}

#[test]
fn explicit_lambda_parameters_pin_the_declared_types_and_the_functional_type() {
    let mut store = TypeStore::with_minimal_jdk();
    let mut session = FakeSession::default();
    let mut resolver = FakeResolver {
        lambda_ok: true,
        ..FakeResolver::default()
    };
    let target = function_string_integer(&mut store);
    let s = string_ty(&mut store);
    let i = integer_ty(&mut store);

    let mut body = Body::new();
    let result = body.alloc(Expr::Standalone(Standalone::typed(i)));
    let lambda = body.alloc(Expr::Lambda(Lambda {
        site: PolySite(0),
        params: vec![Some(s)],
        void_compatible: false,
        value_compatible: true,
        results: vec![result],
        ty: Some(target),
    }));

    let constraint = Constraint::expr(lambda, Relation::Compatible, target);
    let outcome = reduce(&mut store, &body, &mut session, &mut resolver, &constraint)
        .expect("no hard failure");
    // The proper result was checked directly; only the declared parameter
    // and the lambda's own functional type remain as formulas.
    assert_eq!(
        outcome,
        Reduction::Replace(vec![
            Constraint::types(s, Relation::Same, s),
            Constraint::types(target, Relation::Subtype, target),
        ])
    );
    assert_eq!(resolver.body_resolutions, 1);
}

#[test]
fn exact_constructor_ref_emits_one_result_constraint_and_no_parameter_constraints() {
    let mut store = TypeStore::with_minimal_jdk();
    let mut session = FakeSession::default();

    // Supplier<List<? extends Number>> targeted by ArrayList::new.
    let supplier = store.well_known().supplier;
    let list = store.well_known().list;
    let array_list = store.well_known().array_list;
    let number = store.well_known().number;
    let number_ty = store.class_ty(number, vec![]);
    let wildcard = store.wildcard(list, 0, WildcardKind::Extends, Some(number_ty), vec![]);
    let list_ext_number = store.parameterized(list, vec![wildcard], None);
    let target = store.parameterized(supplier, vec![list_ext_number], None);

    let constructed = store.parameterized(array_list, vec![number_ty], None);
    let mut resolver = FakeResolver {
        method_ref: Some(MethodSignature {
            name: "<init>".to_string(),
            owner: array_list,
            type_params: vec![],
            params: vec![],
            return_type: constructed,
            throws: vec![],
            flags: MethodFlags {
                is_constructor: true,
                ..MethodFlags::default()
            },
        }),
        ..FakeResolver::default()
    };

    let mut body = Body::new();
    let al_raw = store.raw(array_list, None);
    let mref = body.alloc(Expr::MethodRef(MethodRef {
        site: PolySite(0),
        receiver: al_raw,
        name: "new".to_string(),
        kind: MethodRefKind::Constructor,
        exact: true,
        receiver_parameterized: false,
    }));

    let constraint = Constraint::expr(mref, Relation::Compatible, target);
    let outcome = reduce(&mut store, &body, &mut session, &mut resolver, &constraint)
        .expect("no hard failure");
    assert_eq!(
        outcome,
        Reduction::Replace(vec![Constraint::types(
            constructed,
            Relation::Compatible,
            list_ext_number,
        )])
    );
}

#[test]
fn parameter_count_delta_of_one_binds_the_receiver_and_shifts_the_pairing() {
    let mut store = TypeStore::with_minimal_jdk();
    let mut session = FakeSession::default();
    let object = store.object_ty();
    let s = string_ty(&mut store);
    let i = integer_ty(&mut store);

    // interface TwoApply { Object m(String, Integer); }
    let two_apply = store.add_class(ClassDef {
        name: "test.TwoApply".to_string(),
        kind: ClassKind::Interface,
        type_params: vec![],
        super_class: None,
        interfaces: vec![],
        methods: vec![MethodDef {
            name: "m".to_string(),
            type_params: vec![],
            params: vec![s, i],
            return_type: object,
            throws: vec![],
            flags: MethodFlags::abstract_instance(),
        }],
        constructors: vec![],
    });
    let target = store.class_ty(two_apply, vec![]);

    // String::frob, an instance method taking one Integer.
    let string_cls = store.well_known().string;
    let mut resolver = FakeResolver {
        method_ref: Some(MethodSignature {
            name: "frob".to_string(),
            owner: string_cls,
            type_params: vec![],
            params: vec![i],
            return_type: s,
            throws: vec![],
            flags: MethodFlags::default(),
        }),
        ..FakeResolver::default()
    };

    let mut body = Body::new();
    let mref = body.alloc(Expr::MethodRef(MethodRef {
        site: PolySite(0),
        receiver: s,
        name: "frob".to_string(),
        kind: MethodRefKind::Instance,
        exact: true,
        receiver_parameterized: false,
    }));

    let constraint = Constraint::expr(mref, Relation::Compatible, target);
    let outcome = reduce(&mut store, &body, &mut session, &mut resolver, &constraint)
        .expect("no hard failure");
    assert_eq!(
        outcome,
        Reduction::Replace(vec![
            // SAM parameter 0 pairs with the receiver type,
            Constraint::types(s, Relation::Compatible, s),
            // SAM parameter 1 shifts down to the candidate's parameter 0,
            Constraint::types(i, Relation::Compatible, i),
            // and the candidate's result feeds the SAM return type.
            Constraint::types(s, Relation::Compatible, object),
        ])
    );
}

#[test]
fn inexact_constructor_ref_runs_invocation_inference_and_pins_the_constructed_type() {
    let mut store = TypeStore::with_minimal_jdk();
    let mut session = FakeSession::default();

    // Supplier<List<Number>> targeted by ArrayList<Number>::new where the
    // constructor is still generic in its class parameter.
    let supplier = store.well_known().supplier;
    let list = store.well_known().list;
    let array_list = store.well_known().array_list;
    let number_ty = store.class_ty(store.well_known().number, vec![]);
    let list_number = store.parameterized(list, vec![number_ty], None);
    let target = store.parameterized(supplier, vec![list_number], None);

    let e = store.add_type_param("E", vec![store.object_ty()]);
    let e_ty = store.ty_var(e);
    let constructed_open = store.parameterized(array_list, vec![e_ty], None);
    let mut resolver = FakeResolver {
        method_ref: Some(MethodSignature {
            name: "<init>".to_string(),
            owner: array_list,
            type_params: vec![e],
            params: vec![],
            return_type: constructed_open,
            throws: vec![],
            flags: MethodFlags {
                is_constructor: true,
                ..MethodFlags::default()
            },
        }),
        ..FakeResolver::default()
    };

    let mut body = Body::new();
    let al_number = store.parameterized(array_list, vec![number_ty], None);
    let mref = body.alloc(Expr::MethodRef(MethodRef {
        site: PolySite(5),
        receiver: al_number,
        name: "new".to_string(),
        kind: MethodRefKind::Constructor,
        exact: false,
        receiver_parameterized: true,
    }));

    let constraint = Constraint::expr(mref, Relation::Compatible, target);
    let outcome = reduce(&mut store, &body, &mut session, &mut resolver, &constraint)
        .expect("no hard failure");
    // The contract's parameter types stood in for arguments, the result fed
    // the contract's return type, and the explicitly parameterized receiver
    // pinned the constructed type with a second incorporation.
    assert_eq!(outcome, Reduction::Absorbed);
    assert_eq!(
        session.events,
        vec!["params:<init>:0", "throws:<init>", "incorporate", "incorporate"]
    );
    assert!(session.active.is_empty());
}

#[test]
fn standalone_constant_narrows_against_a_proper_primitive_target() {
    let mut store = TypeStore::with_minimal_jdk();
    let mut session = FakeSession::default();
    let mut resolver = FakeResolver::default();
    let byte_ty = store.primitive(PrimitiveType::Byte);
    let int_ty = store.int_ty();

    let mut body = Body::new();
    let in_range = body.alloc(Expr::Standalone(Standalone {
        ty: Some(int_ty),
        constant: Some(100),
        unresolved_receiver: false,
    }));
    let plain = body.alloc(Expr::Standalone(Standalone::typed(int_ty)));

    let ok = reduce(
        &mut store,
        &body,
        &mut session,
        &mut resolver,
        &Constraint::expr(in_range, Relation::Compatible, byte_ty),
    )
    .expect("no hard failure");
    assert_eq!(ok, Reduction::True);

    let not_ok = reduce(
        &mut store,
        &body,
        &mut session,
        &mut resolver,
        &Constraint::expr(plain, Relation::Compatible, byte_ty),
    )
    .expect("no hard failure");
    assert_eq!(not_ok, Reduction::False);
}

#[test]
fn standalone_with_an_unresolved_receiver_defers_instead_of_failing() {
    let mut store = TypeStore::with_minimal_jdk();
    let mut session = FakeSession::default();
    let mut resolver = FakeResolver::default();
    let target = string_ty(&mut store);

    let mut body = Body::new();
    let broken = body.alloc(Expr::Standalone(Standalone {
        ty: None,
        constant: None,
        unresolved_receiver: true,
    }));
    let missing = body.alloc(Expr::Standalone(Standalone {
        ty: None,
        constant: None,
        unresolved_receiver: false,
    }));

    let deferred = reduce(
        &mut store,
        &body,
        &mut session,
        &mut resolver,
        &Constraint::expr(broken, Relation::Compatible, target),
    )
    .expect("no hard failure");
    assert_eq!(deferred, Reduction::Uncertain);

    let failed = reduce(
        &mut store,
        &body,
        &mut session,
        &mut resolver,
        &Constraint::expr(missing, Relation::Compatible, target),
    )
    .expect("no hard failure");
    assert_eq!(failed, Reduction::False);
}

#[test]
fn standalone_against_an_improper_target_rewrites_to_a_type_constraint() {
    let mut store = TypeStore::with_minimal_jdk();
    let mut session = FakeSession::default();
    let mut resolver = FakeResolver::default();
    let s = string_ty(&mut store);
    let var = store.inference_var(InfVarId(7));

    let mut body = Body::new();
    let plain = body.alloc(Expr::Standalone(Standalone::typed(s)));

    let outcome = reduce(
        &mut store,
        &body,
        &mut session,
        &mut resolver,
        &Constraint::expr(plain, Relation::Compatible, var),
    )
    .expect("no hard failure");
    assert_eq!(
        outcome,
        Reduction::Replace(vec![Constraint::types(s, Relation::Compatible, var)])
    );
}

fn generic_identity(store: &mut TypeStore) -> MethodSignature {
    let t = store.add_type_param("T", vec![store.object_ty()]);
    let t_ty = store.ty_var(t);
    MethodSignature {
        name: "identity".to_string(),
        owner: store.well_known().object,
        type_params: vec![t],
        params: vec![t_ty],
        return_type: t_ty,
        throws: vec![],
        flags: MethodFlags::default(),
    }
}

#[test]
fn generic_invocation_feeds_the_session_and_is_absorbed() {
    let mut store = TypeStore::with_minimal_jdk();
    let mut session = FakeSession::default();
    let mut resolver = FakeResolver::default();
    let target = string_ty(&mut store);
    let binding = generic_identity(&mut store);

    let mut body = Body::new();
    let s = string_ty(&mut store);
    let arg = body.alloc(Expr::Standalone(Standalone::typed(s)));
    let call = body.alloc(Expr::Invocation(Invocation {
        site: PolySite(3),
        binding,
        args: vec![arg],
    }));

    let outcome = reduce(
        &mut store,
        &body,
        &mut session,
        &mut resolver,
        &Constraint::expr(call, Relation::Compatible, target),
    )
    .expect("no hard failure");
    assert_eq!(outcome, Reduction::Absorbed);
    // The nested context was closed again on the way out.
    assert!(session.active.is_empty());
    assert_eq!(
        session.events,
        vec!["params:identity:1", "throws:identity", "incorporate"]
    );
}

#[test]
fn non_generic_invocation_integrates_its_precomputed_bounds() {
    let mut store = TypeStore::with_minimal_jdk();
    let mut session = FakeSession::default();
    let mut resolver = FakeResolver::default();
    let target = string_ty(&mut store);

    let s = string_ty(&mut store);
    let binding = MethodSignature {
        name: "name".to_string(),
        owner: store.well_known().object,
        type_params: vec![],
        params: vec![],
        return_type: s,
        throws: vec![],
        flags: MethodFlags::default(),
    };

    let mut body = Body::new();
    let call = body.alloc(Expr::Invocation(Invocation {
        site: PolySite(9),
        binding,
        args: vec![],
    }));

    let outcome = reduce(
        &mut store,
        &body,
        &mut session,
        &mut resolver,
        &Constraint::expr(call, Relation::Compatible, target),
    )
    .expect("no hard failure");
    assert_eq!(outcome, Reduction::Absorbed);
    assert_eq!(session.events, vec!["integrate:9"]);
    // Integration ran bracketed in the call's own context, closed again on
    // the way out.
    assert_eq!(session.next_token, 1);
    assert!(session.active.is_empty());
}

#[test]
fn void_invocation_in_value_position_raises_a_hard_failure() {
    let mut store = TypeStore::with_minimal_jdk();
    let mut session = FakeSession::default();
    let mut resolver = FakeResolver::default();
    let target = string_ty(&mut store);

    let void_ty = store.void_ty();
    let binding = MethodSignature {
        name: "run".to_string(),
        owner: store.well_known().runnable,
        type_params: vec![],
        params: vec![],
        return_type: void_ty,
        throws: vec![],
        flags: MethodFlags::default(),
    };

    let mut body = Body::new();
    let call = body.alloc(Expr::Invocation(Invocation {
        site: PolySite(0),
        binding,
        args: vec![],
    }));

    let outcome = reduce(
        &mut store,
        &body,
        &mut session,
        &mut resolver,
        &Constraint::expr(call, Relation::Compatible, target),
    );
    assert_eq!(outcome, Err(InferenceFailure::ValuelessExpression));
}

#[test]
fn failure_inside_a_nested_invocation_becomes_a_plain_false() {
    let mut store = TypeStore::with_minimal_jdk();
    let mut session = FakeSession {
        poison_incorporation: true,
        ..FakeSession::default()
    };
    let mut resolver = FakeResolver::default();
    let target = string_ty(&mut store);
    let binding = generic_identity(&mut store);

    let mut body = Body::new();
    let s = string_ty(&mut store);
    let arg = body.alloc(Expr::Standalone(Standalone::typed(s)));
    let call = body.alloc(Expr::Invocation(Invocation {
        site: PolySite(1),
        binding,
        args: vec![arg],
    }));

    let outcome = reduce(
        &mut store,
        &body,
        &mut session,
        &mut resolver,
        &Constraint::expr(call, Relation::Compatible, target),
    )
    .expect("caught at the suspension boundary");
    assert_eq!(outcome, Reduction::False);
    // The scope guard still restored the outer context.
    assert!(session.active.is_empty());
}

#[test]
fn potentially_compatible_checks_arity_and_shape_only() {
    let mut store = TypeStore::with_minimal_jdk();
    let target = function_string_integer(&mut store);

    let mut body = Body::new();
    let one = body.alloc(Expr::Lambda(Lambda {
        site: PolySite(0),
        params: vec![None],
        void_compatible: false,
        value_compatible: true,
        results: vec![],
        ty: None,
    }));
    let two = body.alloc(Expr::Lambda(Lambda {
        site: PolySite(1),
        params: vec![None, None],
        void_compatible: false,
        value_compatible: true,
        results: vec![],
        ty: None,
    }));

    assert!(potentially_compatible(&mut store, &body, one, target));
    assert!(!potentially_compatible(&mut store, &body, two, target));
}

#[test]
fn lambda_input_variables_are_the_target_placeholder_or_the_sam_parameters() {
    let mut store = TypeStore::with_minimal_jdk();
    let var = store.inference_var(InfVarId(0));

    let mut body = Body::new();
    let lambda = body.alloc(Expr::Lambda(Lambda {
        site: PolySite(0),
        params: vec![None],
        void_compatible: false,
        value_compatible: true,
        results: vec![],
        ty: None,
    }));

    let against_var = Constraint::expr(lambda, Relation::Compatible, var);
    assert_eq!(input_variables(&mut store, &body, &against_var), vec![var]);

    // A Function<#0, Integer> target leaks the parameter placeholder.
    let function = store.well_known().function;
    let i = integer_ty(&mut store);
    let target = store.parameterized(function, vec![var, i], None);
    let against_sam = Constraint::expr(lambda, Relation::Compatible, target);
    assert_eq!(input_variables(&mut store, &body, &against_sam), vec![var]);
}

#[test]
fn conditional_input_variables_union_both_branches() {
    let mut store = TypeStore::with_minimal_jdk();
    let var = store.inference_var(InfVarId(4));

    let mut body = Body::new();
    let then_expr = body.alloc(Expr::Lambda(Lambda {
        site: PolySite(0),
        params: vec![None],
        void_compatible: false,
        value_compatible: true,
        results: vec![],
        ty: None,
    }));
    let s = string_ty(&mut store);
    let else_expr = body.alloc(Expr::Standalone(Standalone::typed(s)));
    let cond = body.alloc(Expr::Conditional(Conditional {
        then_expr,
        else_expr,
    }));

    let constraint = Constraint::expr(cond, Relation::Compatible, var);
    assert_eq!(input_variables(&mut store, &body, &constraint), vec![var]);
}
