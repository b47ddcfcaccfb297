//! Java-like textual rendering of interned types.
//!
//! The output is stable and intended for diagnostics and tests; it does not
//! try to reproduce source spellings exactly.

use crate::decl::WildcardKind;
use crate::store::{TyData, TyId, TypeStore};

pub fn format_type(store: &TypeStore, ty: TyId) -> String {
    match store.data(ty) {
        TyData::Primitive(p) => p.as_str().to_string(),
        TyData::Void => "void".to_string(),
        TyData::Null => "null".to_string(),
        TyData::Error => "<error>".to_string(),
        TyData::Class(id) => class_name(store, *id),
        TyData::Raw { origin, .. } => class_name(store, *origin),
        TyData::Parameterized { origin, args, .. } => {
            let args: Vec<String> = args.iter().map(|&a| format_type(store, a)).collect();
            format!("{}<{}>", class_name(store, *origin), args.join(", "))
        }
        TyData::Wildcard { kind, bound, .. } => match (kind, bound) {
            (WildcardKind::Unbounded, _) => "?".to_string(),
            (WildcardKind::Extends, Some(b)) => format!("? extends {}", format_type(store, *b)),
            (WildcardKind::Super, Some(b)) => format!("? super {}", format_type(store, *b)),
            _ => "?".to_string(),
        },
        TyData::Capture {
            wildcard, position, ..
        } => format!("capture#{} of {}", position, format_type(store, *wildcard)),
        TyData::Intersection(parts) => {
            let parts: Vec<String> = parts.iter().map(|&p| format_type(store, p)).collect();
            parts.join(" & ")
        }
        TyData::Array { component, dims } => {
            let mut out = format_type(store, *component);
            for _ in 0..*dims {
                out.push_str("[]");
            }
            out
        }
        TyData::TypeVar(v) => store
            .type_param(*v)
            .map(|tp| tp.name.clone())
            .unwrap_or_else(|| format!("T#{}", v.0)),
        TyData::InferenceVar(v) => format!("#{}", v.0),
    }
}

fn class_name(store: &TypeStore, id: crate::ClassId) -> String {
    store
        .class(id)
        .map(|def| {
            def.name
                .rsplit('.')
                .next()
                .unwrap_or(def.name.as_str())
                .to_string()
        })
        .unwrap_or_else(|| format!("<class#{}>", id.0))
}
