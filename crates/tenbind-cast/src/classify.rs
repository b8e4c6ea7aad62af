//! Capability Classifier
//!
//! Resolves the caster category of a dense type at compile time from the
//! three predicates its [`Kind`] declares. Resolution goes by elimination:
//! a type that owns its storage is plain, one that must bind an existing
//! buffer is a ref, one that maps external memory is a map, and anything
//! left over is an expression. Every kind lands in exactly one category.

use std::fmt;

use tenbind_dense::{DenseBase, Kind};

/// Caster category of a dense type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Owning aggregate, imported by copy
    Plain,
    /// Lazy expression, export only
    Expression,
    /// Map view, imported without copying
    Map,
    /// Ref view, binds to an existing buffer
    Ref,
}

impl Category {
    /// Get the category name
    pub fn name(&self) -> &'static str {
        match self {
            Category::Plain => "plain",
            Category::Expression => "expression",
            Category::Map => "map",
            Category::Ref => "ref",
        }
    }

    /// Check if values of this category can be imported at all
    pub fn is_importable(&self) -> bool {
        !matches!(self, Category::Expression)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve a category from the three capability predicates
pub const fn classify(owns_storage: bool, maps_external: bool, binds_existing: bool) -> Category {
    if owns_storage {
        Category::Plain
    } else if binds_existing {
        Category::Ref
    } else if maps_external {
        Category::Map
    } else {
        Category::Expression
    }
}

/// Category of the dense type `A`
pub const fn category<A: DenseBase>() -> Category {
    classify(
        <A::Kind as Kind>::OWNS_STORAGE,
        <A::Kind as Kind>::MAPS_EXTERNAL,
        <A::Kind as Kind>::BINDS_EXISTING,
    )
}

/// Check if `A` is a plain aggregate
pub const fn is_plain<A: DenseBase>() -> bool {
    matches!(category::<A>(), Category::Plain)
}

/// Check if `A` is an expression
pub const fn is_expression<A: DenseBase>() -> bool {
    matches!(category::<A>(), Category::Expression)
}

/// Check if `A` is a map view
pub const fn is_map<A: DenseBase>() -> bool {
    matches!(category::<A>(), Category::Map)
}

/// Check if `A` is a ref view
pub const fn is_ref<A: DenseBase>() -> bool {
    matches!(category::<A>(), Category::Ref)
}

const _: () = assert!(is_plain::<tenbind_dense::MatrixX<f64>>());
const _: () = assert!(is_map::<tenbind_dense::Map<'static, tenbind_dense::MatrixX<f64>>>());
const _: () = assert!(is_ref::<tenbind_dense::Ref<'static, tenbind_dense::VectorX<u32>>>());

#[cfg(test)]
mod tests {
    use super::*;
    use tenbind_dense::{
        Const, CwiseBinary, Map, Matrix4, MatrixX, Ref, Scaled, Strided, Sum, Vector3,
    };

    #[test]
    fn test_classification_by_elimination() {
        assert_eq!(classify(true, false, false), Category::Plain);
        assert_eq!(classify(false, true, true), Category::Ref);
        assert_eq!(classify(false, true, false), Category::Map);
        assert_eq!(classify(false, false, false), Category::Expression);
    }

    #[test]
    fn test_categories_of_dense_types() {
        assert_eq!(category::<Matrix4<f32>>(), Category::Plain);
        assert_eq!(category::<Vector3<i64>>(), Category::Plain);
        assert_eq!(category::<Map<'static, MatrixX<u8>, Strided>>(), Category::Map);
        assert_eq!(category::<Ref<'static, MatrixX<u8>, Const>>(), Category::Ref);
        assert_eq!(
            category::<CwiseBinary<'static, MatrixX<f64>, MatrixX<f64>, Sum>>(),
            Category::Expression
        );
        assert_eq!(category::<Scaled<'static, Vector3<f64>>>(), Category::Expression);
    }

    #[test]
    fn test_exactly_one_predicate_holds() {
        fn count<A: DenseBase>() -> usize {
            [is_plain::<A>(), is_expression::<A>(), is_map::<A>(), is_ref::<A>()]
                .iter()
                .filter(|&&hit| hit)
                .count()
        }

        assert_eq!(count::<MatrixX<f64>>(), 1);
        assert_eq!(count::<Map<'static, MatrixX<f64>>>(), 1);
        assert_eq!(count::<Ref<'static, MatrixX<f64>>>(), 1);
        assert_eq!(count::<Scaled<'static, MatrixX<f64>>>(), 1);
        assert!(!Category::Expression.is_importable());
    }
}
