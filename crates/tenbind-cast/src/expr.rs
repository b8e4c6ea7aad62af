//! Expression export.
//!
//! Expressions are never imported. On export they are evaluated into their
//! plain object, which is then handed over by value under the move policy,
//! whatever policy was asked for.

use std::marker::PhantomData;

use tenbind_dense::{BinaryOp, CwiseBinary, DenseBase, Expression, Scaled};
use tenbind_runtime::HostValue;
use tenbind_tensor::{CleanupList, ExportPolicy};

use crate::caster::{CastName, IntoHost, ToHost};
use crate::plain::{self, tensor_spec};

/// Export-only caster for lazy expressions.
///
/// Expressions export by evaluating:
///
/// ```
/// use tenbind_cast::{to_host, ExportPolicy};
/// use tenbind_dense::{DenseExt, MatrixX};
///
/// let m = MatrixX::<f64>::zeros(2, 2).unwrap();
/// let host = to_host(m.scaled(2.0), ExportPolicy::Automatic);
/// assert_eq!(host.as_array().unwrap().shape(), &[2, 2]);
/// ```
///
/// but have no import, so asking for one doesn't compile:
///
/// ```compile_fail
/// use tenbind_cast::{cast, to_host, ExportPolicy};
/// use tenbind_dense::{MatrixX, Scaled};
///
/// let host = to_host(MatrixX::<f64>::zeros(2, 2).unwrap(), ExportPolicy::Copy);
/// let _ = cast::<Scaled<'static, MatrixX<f64>>>(&host);
/// ```
///
/// ```compile_fail
/// use tenbind_cast::{load, to_host, CastFlags, CleanupList, ExportPolicy};
/// use tenbind_dense::{CwiseBinary, MatrixX, Sum};
///
/// let host = to_host(MatrixX::<f64>::zeros(2, 2).unwrap(), ExportPolicy::Copy);
/// let cleanup = CleanupList::new();
/// let _ = load::<CwiseBinary<'_, MatrixX<f64>, MatrixX<f64>, Sum>>(
///     &host,
///     CastFlags::CONVERT,
///     &cleanup,
/// );
/// ```
#[derive(Debug)]
pub struct ExprCaster<E>(PhantomData<E>);

impl<E> ExprCaster<E>
where
    E: DenseBase<Kind = Expression>,
    E::PlainObject: 'static,
{
    /// Get the display name of the arrays produced.
    ///
    /// Extents come from the expression, which may know an axis
    /// statically where its plain object doesn't.
    pub fn name() -> String {
        tensor_spec::<E>().name()
    }

    /// Evaluate `expr` and export the result
    pub fn to_host(expr: &E, policy: ExportPolicy, cleanup: &CleanupList) -> HostValue {
        tracing::trace!(requested = %policy, rows = expr.rows(), cols = expr.cols(), "evaluating expression for export");
        plain::export_owned(expr.eval(), ExportPolicy::Move, cleanup)
    }
}

impl<'e, L, R, Op> ToHost for CwiseBinary<'e, L, R, Op>
where
    L: DenseBase,
    R: DenseBase<Scalar = L::Scalar>,
    Op: BinaryOp<L::Scalar>,
    L::PlainObject: 'static,
{
    fn to_host(&self, policy: ExportPolicy, cleanup: &CleanupList) -> HostValue {
        ExprCaster::<Self>::to_host(self, policy, cleanup)
    }
}

impl<'e, L, R, Op> IntoHost for CwiseBinary<'e, L, R, Op>
where
    L: DenseBase,
    R: DenseBase<Scalar = L::Scalar>,
    Op: BinaryOp<L::Scalar>,
    L::PlainObject: 'static,
{
    fn into_host(self, policy: ExportPolicy, cleanup: &CleanupList) -> HostValue {
        ExprCaster::<Self>::to_host(&self, policy, cleanup)
    }
}

impl<'e, L, R, Op> CastName for CwiseBinary<'e, L, R, Op>
where
    L: DenseBase,
    R: DenseBase<Scalar = L::Scalar>,
    Op: BinaryOp<L::Scalar>,
    L::PlainObject: 'static,
{
    fn cast_name() -> String {
        ExprCaster::<Self>::name()
    }
}

impl<'e, A> ToHost for Scaled<'e, A>
where
    A: DenseBase,
    A::PlainObject: 'static,
{
    fn to_host(&self, policy: ExportPolicy, cleanup: &CleanupList) -> HostValue {
        ExprCaster::<Self>::to_host(self, policy, cleanup)
    }
}

impl<'e, A> IntoHost for Scaled<'e, A>
where
    A: DenseBase,
    A::PlainObject: 'static,
{
    fn into_host(self, policy: ExportPolicy, cleanup: &CleanupList) -> HostValue {
        ExprCaster::<Self>::to_host(&self, policy, cleanup)
    }
}

impl<'e, A> CastName for Scaled<'e, A>
where
    A: DenseBase,
    A::PlainObject: 'static,
{
    fn cast_name() -> String {
        ExprCaster::<Self>::name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tenbind_dense::{DenseExt, Matrix4, MatrixX, MatrixXR, Sum, VectorX};

    #[test]
    fn test_reference_request_still_materializes() {
        let a = MatrixX::<i32>::from_row_slice(2, 2, &[1, 2, 3, 4]).unwrap();
        let b = MatrixXR::<i32>::from_row_slice(2, 2, &[10, 20, 30, 40]).unwrap();
        let cleanup = CleanupList::new();

        let out = a.plus(&b).to_host(ExportPolicy::Reference, &cleanup);
        let array = out.as_array().unwrap();
        assert!(array.owns_data());
        assert!(array.is_writeable());
        assert_eq!(array.to_vec::<i32>().unwrap(), vec![11, 22, 33, 44]);
    }

    #[test]
    fn test_large_expression_moves() {
        let v = VectorX::<f64>::from_vector_slice(&[1.5; 512]).unwrap();
        let cleanup = CleanupList::new();
        let out = v.scaled(2.0).into_host(ExportPolicy::Copy, &cleanup);
        let array = out.as_array().unwrap();
        assert!(matches!(array.base(), Some(HostValue::Capsule(_))));
        assert_eq!(array.get::<f64>(&[511]).unwrap(), 3.0);
    }

    #[test]
    fn test_expression_name_is_plain_name() {
        type Expr = Scaled<'static, MatrixXR<f32>>;
        assert_eq!(Expr::cast_name(), MatrixXR::<f32>::cast_name());
    }

    #[test]
    fn test_name_keeps_static_extents_of_either_operand() {
        type Mixed = CwiseBinary<'static, MatrixX<f64>, Matrix4<f64>, Sum>;
        insta::assert_snapshot!(
            Mixed::cast_name(),
            @"numpy.ndarray[dtype=float64, shape=(4, 4), order='F']"
        );
        type Dynamic = CwiseBinary<'static, MatrixX<f64>, MatrixX<f64>, Sum>;
        assert_eq!(Dynamic::cast_name(), MatrixX::<f64>::cast_name());
    }
}
