use pretty_assertions::assert_eq;

use lyra_types::{TyData, TypeStore, WildcardKind};

#[test]
fn parameterized_requests_with_equal_constituents_share_one_id() {
    let mut store = TypeStore::with_minimal_jdk();
    let list = store.well_known().list;
    let string = store.well_known().string;
    let string_ty = store.class_ty(string, vec![]);

    let a = store.parameterized(list, vec![string_ty], None);
    let b = store.parameterized(list, vec![string_ty], None);
    assert_eq!(a, b);
}

#[test]
fn freshly_rebuilt_wildcard_argument_still_dedupes() {
    let mut store = TypeStore::with_minimal_jdk();
    let list = store.well_known().list;
    let number = store.well_known().number;
    let number_ty = store.class_ty(number, vec![]);

    let w1 = store.wildcard(list, 0, WildcardKind::Extends, Some(number_ty), vec![]);
    let first = store.parameterized(list, vec![w1], None);

    // Building the wildcard a second time must hand back the interned one,
    // and through it the same parameterized type.
    let w2 = store.wildcard(list, 0, WildcardKind::Extends, Some(number_ty), vec![]);
    let second = store.parameterized(list, vec![w2], None);

    assert_eq!(w1, w2);
    assert_eq!(first, second);
}

#[test]
fn array_types_intern_and_flatten_dimensions() {
    let mut store = TypeStore::with_minimal_jdk();
    let string = store.well_known().string;
    let string_ty = store.class_ty(string, vec![]);

    let one = store.array(string_ty, 1);
    let two_direct = store.array(string_ty, 2);
    let two_nested = store.array(one, 1);
    assert_eq!(two_direct, two_nested);

    match store.data(two_nested) {
        TyData::Array { component, dims } => {
            assert_eq!(*component, string_ty);
            assert_eq!(*dims, 2);
        }
        other => panic!("expected array, got {other:?}"),
    }
}

#[test]
fn intersection_puts_the_class_constituent_first() {
    let mut store = TypeStore::with_minimal_jdk();
    let string_ty = store.class_ty(store.well_known().string, vec![]);
    let cloneable_ty = store.class_ty(store.well_known().cloneable, vec![]);
    let serializable_ty = store.class_ty(store.well_known().serializable, vec![]);

    let a = store.intersection(vec![cloneable_ty, string_ty, serializable_ty]);
    match store.data(a) {
        TyData::Intersection(parts) => assert_eq!(parts[0], string_ty),
        other => panic!("expected intersection, got {other:?}"),
    }
}

#[test]
fn singleton_intersection_collapses_to_its_member() {
    let mut store = TypeStore::with_minimal_jdk();
    let string_ty = store.class_ty(store.well_known().string, vec![]);
    let collapsed = store.intersection(vec![string_ty, string_ty]);
    assert_eq!(collapsed, string_ty);
}

#[test]
fn reset_discards_every_interned_type() {
    let mut store = TypeStore::with_minimal_jdk();
    let list = store.well_known().list;
    let string_ty = store.class_ty(store.well_known().string, vec![]);
    store.parameterized(list, vec![string_ty], None);

    store.reset();

    // The rebuilt store has only the bootstrap declarations again.
    let list = store.well_known().list;
    let string_ty = store.class_ty(store.well_known().string, vec![]);
    let rebuilt = store.parameterized(list, vec![string_ty], None);
    let again = store.parameterized(list, vec![string_ty], None);
    assert_eq!(rebuilt, again);
}
