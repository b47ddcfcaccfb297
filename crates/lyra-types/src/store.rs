//! The canonicalizing type store.
//!
//! One `TypeStore` corresponds to one compilation session. It owns the class
//! and type-parameter registries, the interning tables for every derived
//! type, and the memo tables used by the compatibility oracle and the SAM
//! resolver. All algorithms take the store by `&mut`; the borrow checker
//! supplies the single-writer guarantee the memo tables need.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::compat::CompatMemo;
use crate::decl::{
    ClassDef, ClassId, ClassKind, InfVarId, MethodDef, MethodFlags, MethodSignature,
    PrimitiveType, TypeParamDef, TypeVarId, WildcardKind,
};
use crate::sam::SamError;

/// Id of an interned type. Within one session, `TyId` equality is
/// equivalent to structural equality of the underlying [`TyData`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TyId(pub u32);

/// The tagged representation of a type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TyData {
    Primitive(PrimitiveType),
    /// Reference to a non-generic class or interface declaration.
    Class(ClassId),
    Parameterized {
        origin: ClassId,
        args: Vec<TyId>,
        enclosing: Option<TyId>,
    },
    /// A generic declaration used with its type arguments erased.
    Raw {
        origin: ClassId,
        enclosing: Option<TyId>,
    },
    /// A wildcard type argument, identified by the generic declaration and
    /// argument position it occurs at.
    Wildcard {
        origin: ClassId,
        rank: u32,
        kind: WildcardKind,
        bound: Option<TyId>,
        extra_bounds: Vec<TyId>,
    },
    /// A fresh nominal type standing in for one occurrence of a wildcard at
    /// one use site. The lower bound is synthesized when the wildcard is
    /// `super`-bounded.
    Capture {
        wildcard: TyId,
        context: TyId,
        position: u32,
        upper_bounds: Vec<TyId>,
        lower_bound: Option<TyId>,
    },
    /// Conjunction of several types. The class constituent, if any, comes
    /// first; the rest are interfaces.
    Intersection(Vec<TyId>),
    Array {
        component: TyId,
        dims: u32,
    },
    TypeVar(TypeVarId),
    /// Unresolved placeholder scoped to one inference session.
    InferenceVar(InfVarId),
    Void,
    Null,
    /// Placeholder for a type whose declaration could not be resolved
    /// upstream. Never produced by the store itself.
    Error,
}

/// Frequently needed declarations from the bootstrap class set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WellKnownTypes {
    pub object: ClassId,
    pub string: ClassId,
    pub number: ClassId,
    pub integer: ClassId,
    pub boxed_boolean: ClassId,
    pub cloneable: ClassId,
    pub serializable: ClassId,
    pub iterable: ClassId,
    pub collection: ClassId,
    pub list: ClassId,
    pub array_list: ClassId,
    pub runnable: ClassId,
    pub callable: ClassId,
    pub function: ClassId,
    pub supplier: ClassId,
    pub consumer: ClassId,
    pub throwable: ClassId,
    pub exception: ClassId,
    pub runtime_exception: ClassId,
    pub io_exception: ClassId,
}

pub struct TypeStore {
    types: Vec<TyData>,
    intern_map: HashMap<TyData, TyId>,
    classes: Vec<ClassDef>,
    class_by_name: HashMap<String, ClassId>,
    type_params: Vec<TypeParamDef>,
    well_known: WellKnownTypes,
    object_ty: TyId,
    void_ty: TyId,
    null_ty: TyId,
    error_ty: TyId,
    pub(crate) compat_memo: HashMap<(TyId, TyId), CompatMemo>,
    pub(crate) sam_memo: HashMap<(TyId, bool), Result<MethodSignature, SamError>>,
    /// Pairs currently being tested by `is_subtype`; a pair already present
    /// answers false, which terminates mutually-referential bound recursion.
    pub(crate) subtype_guard: std::collections::HashSet<(TyId, TyId)>,
}

impl TypeStore {
    /// Build a store bootstrapped with a minimal `java.*` class set, enough
    /// for the inference algorithms and their tests to run without a real
    /// classpath behind them.
    pub fn with_minimal_jdk() -> Self {
        let mut store = Self {
            types: Vec::new(),
            intern_map: HashMap::new(),
            classes: Vec::new(),
            class_by_name: HashMap::new(),
            type_params: Vec::new(),
            // Patched below once the bootstrap classes exist.
            well_known: WellKnownTypes {
                object: ClassId(0),
                string: ClassId(0),
                number: ClassId(0),
                integer: ClassId(0),
                boxed_boolean: ClassId(0),
                cloneable: ClassId(0),
                serializable: ClassId(0),
                iterable: ClassId(0),
                collection: ClassId(0),
                list: ClassId(0),
                array_list: ClassId(0),
                runnable: ClassId(0),
                callable: ClassId(0),
                function: ClassId(0),
                supplier: ClassId(0),
                consumer: ClassId(0),
                throwable: ClassId(0),
                exception: ClassId(0),
                runtime_exception: ClassId(0),
                io_exception: ClassId(0),
            },
            object_ty: TyId(0),
            void_ty: TyId(0),
            null_ty: TyId(0),
            error_ty: TyId(0),
            compat_memo: HashMap::new(),
            sam_memo: HashMap::new(),
            subtype_guard: std::collections::HashSet::new(),
        };
        store.void_ty = store.intern(TyData::Void);
        store.null_ty = store.intern(TyData::Null);
        store.error_ty = store.intern(TyData::Error);
        store.bootstrap_minimal_jdk();
        store
    }

    /// Drop every interned type, class, memo entry and type parameter and
    /// rebuild the bootstrap class set. All outstanding [`TyId`]s,
    /// [`ClassId`]s and [`TypeVarId`]s are invalidated.
    pub fn reset(&mut self) {
        *self = Self::with_minimal_jdk();
    }

    fn bootstrap_minimal_jdk(&mut self) {
        let object = self.add_class(ClassDef {
            name: "java.lang.Object".to_string(),
            kind: ClassKind::Class,
            type_params: vec![],
            super_class: None,
            interfaces: vec![],
            methods: vec![],
            constructors: vec![],
        });
        let object_ty = self.intern(TyData::Class(object));
        self.object_ty = object_ty;

        let string = self.add_simple_class("java.lang.String", object_ty);
        let string_ty = self.intern(TyData::Class(string));
        let number = self.add_simple_class("java.lang.Number", object_ty);
        let number_ty = self.intern(TyData::Class(number));
        let integer = self.add_simple_class("java.lang.Integer", number_ty);
        let boxed_boolean = self.add_simple_class("java.lang.Boolean", object_ty);
        let cloneable = self.add_simple_interface("java.lang.Cloneable");
        let serializable = self.add_simple_interface("java.io.Serializable");

        let throwable = self.add_simple_class("java.lang.Throwable", object_ty);
        let throwable_ty = self.intern(TyData::Class(throwable));
        let exception = self.add_simple_class("java.lang.Exception", throwable_ty);
        let exception_ty = self.intern(TyData::Class(exception));
        let runtime_exception = self.add_simple_class("java.lang.RuntimeException", exception_ty);
        let io_exception = self.add_simple_class("java.io.IOException", exception_ty);

        // Object's own contract, needed so the SAM resolver can recognize
        // redeclarations of Object methods on interfaces.
        let bool_ty = self.primitive(PrimitiveType::Boolean);
        let int_ty = self.primitive(PrimitiveType::Int);
        self.classes[object.0 as usize].methods = vec![
            MethodDef {
                name: "equals".to_string(),
                type_params: vec![],
                params: vec![object_ty],
                return_type: bool_ty,
                throws: vec![],
                flags: MethodFlags::default(),
            },
            MethodDef {
                name: "hashCode".to_string(),
                type_params: vec![],
                params: vec![],
                return_type: int_ty,
                throws: vec![],
                flags: MethodFlags::default(),
            },
            MethodDef {
                name: "toString".to_string(),
                type_params: vec![],
                params: vec![],
                return_type: string_ty,
                throws: vec![],
                flags: MethodFlags::default(),
            },
        ];

        // Iterable<T>, Collection<E>, List<E>, ArrayList<E>.
        let iterable_t = self.add_type_param("T", vec![object_ty]);
        let iterable = self.add_class(ClassDef {
            name: "java.lang.Iterable".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![iterable_t],
            super_class: None,
            interfaces: vec![],
            methods: vec![],
            constructors: vec![],
        });

        let collection_e = self.add_type_param("E", vec![object_ty]);
        let collection_e_ty = self.intern(TyData::TypeVar(collection_e));
        let collection_iface = self.intern(TyData::Parameterized {
            origin: iterable,
            args: vec![collection_e_ty],
            enclosing: None,
        });
        let collection = self.add_class(ClassDef {
            name: "java.util.Collection".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![collection_e],
            super_class: None,
            interfaces: vec![collection_iface],
            methods: vec![
                MethodDef {
                    name: "add".to_string(),
                    type_params: vec![],
                    params: vec![collection_e_ty],
                    return_type: bool_ty,
                    throws: vec![],
                    flags: MethodFlags::abstract_instance(),
                },
                MethodDef {
                    name: "size".to_string(),
                    type_params: vec![],
                    params: vec![],
                    return_type: int_ty,
                    throws: vec![],
                    flags: MethodFlags::abstract_instance(),
                },
            ],
            constructors: vec![],
        });

        let list_e = self.add_type_param("E", vec![object_ty]);
        let list_e_ty = self.intern(TyData::TypeVar(list_e));
        let list_iface = self.intern(TyData::Parameterized {
            origin: collection,
            args: vec![list_e_ty],
            enclosing: None,
        });
        let list = self.add_class(ClassDef {
            name: "java.util.List".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![list_e],
            super_class: None,
            interfaces: vec![list_iface],
            methods: vec![MethodDef {
                name: "get".to_string(),
                type_params: vec![],
                params: vec![int_ty],
                return_type: list_e_ty,
                throws: vec![],
                flags: MethodFlags::abstract_instance(),
            }],
            constructors: vec![],
        });

        let array_list_e = self.add_type_param("E", vec![object_ty]);
        let array_list_e_ty = self.intern(TyData::TypeVar(array_list_e));
        let array_list_iface = self.intern(TyData::Parameterized {
            origin: list,
            args: vec![array_list_e_ty],
            enclosing: None,
        });
        let extends_e = self.intern(TyData::Wildcard {
            origin: collection,
            rank: 0,
            kind: WildcardKind::Extends,
            bound: Some(array_list_e_ty),
            extra_bounds: vec![],
        });
        let collection_extends_e = self.intern(TyData::Parameterized {
            origin: collection,
            args: vec![extends_e],
            enclosing: None,
        });
        let array_list = self.add_class(ClassDef {
            name: "java.util.ArrayList".to_string(),
            kind: ClassKind::Class,
            type_params: vec![array_list_e],
            super_class: Some(object_ty),
            interfaces: vec![array_list_iface],
            methods: vec![],
            constructors: vec![
                MethodDef {
                    name: "<init>".to_string(),
                    type_params: vec![],
                    params: vec![],
                    return_type: self.void_ty,
                    throws: vec![],
                    flags: MethodFlags {
                        is_constructor: true,
                        ..MethodFlags::default()
                    },
                },
                MethodDef {
                    name: "<init>".to_string(),
                    type_params: vec![],
                    params: vec![collection_extends_e],
                    return_type: self.void_ty,
                    throws: vec![],
                    flags: MethodFlags {
                        is_constructor: true,
                        ..MethodFlags::default()
                    },
                },
            ],
        });

        // Functional interfaces.
        let void_ty = self.void_ty;
        let runnable = self.add_class(ClassDef {
            name: "java.lang.Runnable".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![],
            super_class: None,
            interfaces: vec![],
            methods: vec![MethodDef {
                name: "run".to_string(),
                type_params: vec![],
                params: vec![],
                return_type: void_ty,
                throws: vec![],
                flags: MethodFlags::abstract_instance(),
            }],
            constructors: vec![],
        });

        let callable_v = self.add_type_param("V", vec![object_ty]);
        let callable_v_ty = self.intern(TyData::TypeVar(callable_v));
        let callable = self.add_class(ClassDef {
            name: "java.util.concurrent.Callable".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![callable_v],
            super_class: None,
            interfaces: vec![],
            methods: vec![MethodDef {
                name: "call".to_string(),
                type_params: vec![],
                params: vec![],
                return_type: callable_v_ty,
                throws: vec![exception_ty],
                flags: MethodFlags::abstract_instance(),
            }],
            constructors: vec![],
        });

        let function_t = self.add_type_param("T", vec![object_ty]);
        let function_r = self.add_type_param("R", vec![object_ty]);
        let function_t_ty = self.intern(TyData::TypeVar(function_t));
        let function_r_ty = self.intern(TyData::TypeVar(function_r));
        let function = self.add_class(ClassDef {
            name: "java.util.function.Function".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![function_t, function_r],
            super_class: None,
            interfaces: vec![],
            methods: vec![MethodDef {
                name: "apply".to_string(),
                type_params: vec![],
                params: vec![function_t_ty],
                return_type: function_r_ty,
                throws: vec![],
                flags: MethodFlags::abstract_instance(),
            }],
            constructors: vec![],
        });

        let supplier_t = self.add_type_param("T", vec![object_ty]);
        let supplier_t_ty = self.intern(TyData::TypeVar(supplier_t));
        let supplier = self.add_class(ClassDef {
            name: "java.util.function.Supplier".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![supplier_t],
            super_class: None,
            interfaces: vec![],
            methods: vec![MethodDef {
                name: "get".to_string(),
                type_params: vec![],
                params: vec![],
                return_type: supplier_t_ty,
                throws: vec![],
                flags: MethodFlags::abstract_instance(),
            }],
            constructors: vec![],
        });

        let consumer_t = self.add_type_param("T", vec![object_ty]);
        let consumer_t_ty = self.intern(TyData::TypeVar(consumer_t));
        let consumer = self.add_class(ClassDef {
            name: "java.util.function.Consumer".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![consumer_t],
            super_class: None,
            interfaces: vec![],
            methods: vec![MethodDef {
                name: "accept".to_string(),
                type_params: vec![],
                params: vec![consumer_t_ty],
                return_type: void_ty,
                throws: vec![],
                flags: MethodFlags::abstract_instance(),
            }],
            constructors: vec![],
        });

        self.well_known = WellKnownTypes {
            object,
            string,
            number,
            integer,
            boxed_boolean,
            cloneable,
            serializable,
            iterable,
            collection,
            list,
            array_list,
            runnable,
            callable,
            function,
            supplier,
            consumer,
            throwable,
            exception,
            runtime_exception,
            io_exception,
        };
    }

    fn add_simple_class(&mut self, name: &str, super_class: TyId) -> ClassId {
        self.add_class(ClassDef {
            name: name.to_string(),
            kind: ClassKind::Class,
            type_params: vec![],
            super_class: Some(super_class),
            interfaces: vec![],
            methods: vec![],
            constructors: vec![],
        })
    }

    fn add_simple_interface(&mut self, name: &str) -> ClassId {
        self.add_class(ClassDef {
            name: name.to_string(),
            kind: ClassKind::Interface,
            type_params: vec![],
            super_class: None,
            interfaces: vec![],
            methods: vec![],
            constructors: vec![],
        })
    }

    // ---- registries ----------------------------------------------------

    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.class_by_name.insert(def.name.clone(), id);
        self.classes.push(def);
        id
    }

    pub fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.0 as usize)
    }

    pub fn class_mut(&mut self, id: ClassId) -> Option<&mut ClassDef> {
        self.classes.get_mut(id.0 as usize)
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.class_by_name.get(name).copied()
    }

    pub fn add_type_param(&mut self, name: &str, upper_bounds: Vec<TyId>) -> TypeVarId {
        let id = TypeVarId(self.type_params.len() as u32);
        self.type_params.push(TypeParamDef {
            name: name.to_string(),
            upper_bounds,
            lower_bound: None,
        });
        id
    }

    pub fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        self.type_params.get(id.0 as usize)
    }

    pub fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }

    // ---- interning -----------------------------------------------------

    pub(crate) fn intern(&mut self, data: TyData) -> TyId {
        if let Some(&id) = self.intern_map.get(&data) {
            return id;
        }
        let id = TyId(self.types.len() as u32);
        self.types.push(data.clone());
        self.intern_map.insert(data, id);
        id
    }

    pub fn data(&self, id: TyId) -> &TyData {
        &self.types[id.0 as usize]
    }

    pub fn primitive(&mut self, p: PrimitiveType) -> TyId {
        self.intern(TyData::Primitive(p))
    }

    pub fn int_ty(&mut self) -> TyId {
        self.primitive(PrimitiveType::Int)
    }

    pub fn object_ty(&self) -> TyId {
        self.object_ty
    }

    pub fn void_ty(&self) -> TyId {
        self.void_ty
    }

    pub fn null_ty(&self) -> TyId {
        self.null_ty
    }

    pub fn error_ty(&self) -> TyId {
        self.error_ty
    }

    pub fn ty_var(&mut self, id: TypeVarId) -> TyId {
        self.intern(TyData::TypeVar(id))
    }

    pub fn inference_var(&mut self, id: InfVarId) -> TyId {
        self.intern(TyData::InferenceVar(id))
    }

    /// Reference type for a class declaration. A generic declaration with an
    /// empty argument list yields the raw type; a matching argument list
    /// yields the parameterized type.
    pub fn class_ty(&mut self, id: ClassId, args: Vec<TyId>) -> TyId {
        if args.is_empty() {
            let generic = self
                .class(id)
                .map(|def| !def.type_params.is_empty())
                .unwrap_or(false);
            if generic {
                return self.raw(id, None);
            }
            return self.intern(TyData::Class(id));
        }
        self.parameterized(id, args, None)
    }

    pub fn parameterized(&mut self, origin: ClassId, args: Vec<TyId>, enclosing: Option<TyId>) -> TyId {
        if args.is_empty() && enclosing.is_none() {
            return self.class_ty(origin, vec![]);
        }
        self.intern(TyData::Parameterized {
            origin,
            args,
            enclosing,
        })
    }

    pub fn raw(&mut self, origin: ClassId, enclosing: Option<TyId>) -> TyId {
        self.intern(TyData::Raw { origin, enclosing })
    }

    pub fn wildcard(
        &mut self,
        origin: ClassId,
        rank: u32,
        kind: WildcardKind,
        bound: Option<TyId>,
        extra_bounds: Vec<TyId>,
    ) -> TyId {
        debug_assert!(
            (kind == WildcardKind::Unbounded) == bound.is_none(),
            "bounded wildcard kinds carry a bound, unbounded ones do not"
        );
        self.intern(TyData::Wildcard {
            origin,
            rank,
            kind,
            bound,
            extra_bounds,
        })
    }

    /// Capture of one wildcard occurrence at a use site. Identical requests
    /// (same wildcard, context type and position) return the same capture.
    pub fn capture(&mut self, wildcard: TyId, context: TyId, position: u32) -> TyId {
        let TyData::Wildcard {
            origin,
            rank,
            kind,
            bound,
            ..
        } = self.data(wildcard).clone()
        else {
            return wildcard;
        };

        let formal = self
            .class(origin)
            .and_then(|def| def.type_params.get(rank as usize).copied())
            .and_then(|tp| self.type_param(tp))
            .and_then(|tp| tp.upper_bounds.first().copied())
            .unwrap_or(self.object_ty);

        let (upper_bounds, lower_bound) = match (kind, bound) {
            (WildcardKind::Unbounded, _) => (vec![formal], None),
            (WildcardKind::Extends, Some(b)) => (vec![crate::ops::glb(self, formal, b)], None),
            (WildcardKind::Super, Some(b)) => (vec![formal], Some(b)),
            // Malformed wildcard data; fall back to the formal bound.
            (_, None) => (vec![formal], None),
        };

        self.intern(TyData::Capture {
            wildcard,
            context,
            position,
            upper_bounds,
            lower_bound,
        })
    }

    pub fn array(&mut self, component: TyId, dims: u32) -> TyId {
        if dims == 0 {
            return component;
        }
        if let TyData::Array {
            component: inner,
            dims: inner_dims,
        } = *self.data(component)
        {
            return self.intern(TyData::Array {
                component: inner,
                dims: inner_dims + dims,
            });
        }
        self.intern(TyData::Array { component, dims })
    }

    /// Intersection of several types. Nested intersections are flattened,
    /// duplicates collapse, the class constituent (if any) moves first, and a
    /// single remaining constituent is returned as-is.
    pub fn intersection(&mut self, parts: Vec<TyId>) -> TyId {
        let mut flat: Vec<TyId> = Vec::with_capacity(parts.len());
        for part in parts {
            match self.data(part) {
                TyData::Intersection(inner) => {
                    let inner = inner.clone();
                    for p in inner {
                        if !flat.contains(&p) {
                            flat.push(p);
                        }
                    }
                }
                _ => {
                    if !flat.contains(&part) {
                        flat.push(part);
                    }
                }
            }
        }
        if flat.len() == 1 {
            return flat[0];
        }
        if let Some(pos) = flat.iter().position(|&p| self.is_class_constituent(p)) {
            let class = flat.remove(pos);
            flat.insert(0, class);
        }
        self.intern(TyData::Intersection(flat))
    }

    fn is_class_constituent(&self, ty: TyId) -> bool {
        let origin = match self.data(ty) {
            TyData::Class(id) => *id,
            TyData::Parameterized { origin, .. } | TyData::Raw { origin, .. } => *origin,
            TyData::Array { .. } => return true,
            _ => return false,
        };
        self.class(origin)
            .map(|def| def.kind == ClassKind::Class)
            .unwrap_or(false)
    }

    /// True when `ty` is a reference type (null is assignable to it).
    pub fn is_reference(&self, ty: TyId) -> bool {
        !matches!(
            self.data(ty),
            TyData::Primitive(_) | TyData::Void | TyData::Null
        )
    }
}
