//! Declaration-side model: classes, interfaces, methods and type parameters.
//!
//! These are the nominal declarations the type universe is built over. Use
//! sites reference them through plain ids; the interned types themselves live
//! in [`crate::TypeStore`].

use serde::{Deserialize, Serialize};

use crate::TyId;

/// Id of a class or interface declaration registered in a [`crate::TypeStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub u32);

/// Id of a declared type parameter (or a capture variable) in a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeVarId(pub u32);

/// Id of an inference variable. Inference variables are owned by one
/// inference session and never outlive it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InfVarId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Char => "char",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    /// Primitive widening conversions (JLS 5.1.2).
    pub fn widens_to(self, other: PrimitiveType) -> bool {
        use PrimitiveType::*;
        if self == other {
            return true;
        }
        match self {
            Byte => matches!(other, Short | Int | Long | Float | Double),
            Short | Char => matches!(other, Int | Long | Float | Double),
            Int => matches!(other, Long | Float | Double),
            Long => matches!(other, Float | Double),
            Float => matches!(other, Double),
            Boolean | Double => false,
        }
    }
}

/// Bound kind of a wildcard type argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WildcardKind {
    Unbounded,
    Extends,
    Super,
}

/// A declared type parameter, or a capture variable allocated during capture
/// conversion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParamDef {
    pub name: String,
    pub upper_bounds: Vec<TyId>,
    pub lower_bound: Option<TyId>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodFlags {
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_default: bool,
    pub is_varargs: bool,
    pub is_constructor: bool,
}

impl MethodFlags {
    pub fn abstract_instance() -> Self {
        Self {
            is_abstract: true,
            ..Self::default()
        }
    }
}

/// A method as declared on a class or interface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<TyId>,
    pub return_type: TyId,
    pub throws: Vec<TyId>,
    pub flags: MethodFlags,
}

/// A resolved method signature: a [`MethodDef`] viewed through a concrete
/// instantiation of its owner, with type-argument substitution applied.
///
/// This is the value the SAM resolver returns and the constraint reduction
/// engine pairs lambda/method-reference shapes against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSignature {
    pub name: String,
    pub owner: ClassId,
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<TyId>,
    pub return_type: TyId,
    pub throws: Vec<TyId>,
    pub flags: MethodFlags,
}

/// A class or interface declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    pub type_params: Vec<TypeVarId>,
    pub super_class: Option<TyId>,
    pub interfaces: Vec<TyId>,
    pub methods: Vec<MethodDef>,
    pub constructors: Vec<MethodDef>,
}
