//! Lazy coefficient-wise expressions.
//!
//! Expressions borrow their operands and compute each coefficient on
//! demand. They own no storage: the only way to get data out of one is
//! [`DenseBase::eval`].

use std::fmt;

use crate::base::{DenseBase, StorageOrder, DYN};
use crate::kind::Expression;
use crate::scalar::Scalar;

/// A binary coefficient-wise operation
pub trait BinaryOp<T: Scalar>: Copy + fmt::Debug + 'static {
    /// Operator symbol used in messages
    const SYMBOL: &'static str;

    /// Combine two coefficients
    fn apply(&self, lhs: T, rhs: T) -> T;
}

/// `lhs + rhs`
#[derive(Debug, Clone, Copy, Default)]
pub struct Sum;

/// `lhs - rhs`
#[derive(Debug, Clone, Copy, Default)]
pub struct Difference;

/// `lhs * rhs`, coefficient-wise
#[derive(Debug, Clone, Copy, Default)]
pub struct Product;

impl<T: Scalar> BinaryOp<T> for Sum {
    const SYMBOL: &'static str = "+";

    fn apply(&self, lhs: T, rhs: T) -> T {
        T::add(lhs, rhs)
    }
}

impl<T: Scalar> BinaryOp<T> for Difference {
    const SYMBOL: &'static str = "-";

    fn apply(&self, lhs: T, rhs: T) -> T {
        T::sub(lhs, rhs)
    }
}

impl<T: Scalar> BinaryOp<T> for Product {
    const SYMBOL: &'static str = "*";

    fn apply(&self, lhs: T, rhs: T) -> T {
        T::mul(lhs, rhs)
    }
}

const fn merge_extent(lhs: usize, rhs: usize) -> usize {
    if lhs != DYN {
        lhs
    } else {
        rhs
    }
}

/// `op(lhs, rhs)` applied coefficient by coefficient.
///
/// The operands may have different storage orders; the expression
/// evaluates in the order of `lhs`.
pub struct CwiseBinary<'a, L, R, Op> {
    lhs: &'a L,
    rhs: &'a R,
    op: Op,
}

impl<'a, L, R, Op> CwiseBinary<'a, L, R, Op>
where
    L: DenseBase,
    R: DenseBase<Scalar = L::Scalar>,
    Op: BinaryOp<L::Scalar>,
{
    /// Combine two operands of the same shape.
    ///
    /// # Panics
    ///
    /// Panics if the runtime shapes differ.
    pub fn new(lhs: &'a L, rhs: &'a R, op: Op) -> Self {
        assert!(
            lhs.rows() == rhs.rows() && lhs.cols() == rhs.cols(),
            "shape mismatch in `{}`: {}x{} vs {}x{}",
            Op::SYMBOL,
            lhs.rows(),
            lhs.cols(),
            rhs.rows(),
            rhs.cols()
        );
        Self { lhs, rhs, op }
    }
}

impl<'a, L, R, Op> DenseBase for CwiseBinary<'a, L, R, Op>
where
    L: DenseBase,
    R: DenseBase<Scalar = L::Scalar>,
    Op: BinaryOp<L::Scalar>,
{
    type Scalar = L::Scalar;
    type Kind = Expression;
    type Order = L::Order;
    type PlainObject = L::PlainObject;

    const ROWS: usize = merge_extent(L::ROWS, R::ROWS);
    const COLS: usize = merge_extent(L::COLS, R::COLS);

    fn rows(&self) -> usize {
        self.lhs.rows()
    }

    fn cols(&self) -> usize {
        self.lhs.cols()
    }

    fn coeff(&self, i: usize, j: usize) -> L::Scalar {
        self.op.apply(self.lhs.coeff(i, j), self.rhs.coeff(i, j))
    }
}

impl<'a, L, R, Op> fmt::Debug for CwiseBinary<'a, L, R, Op>
where
    L: DenseBase,
    R: DenseBase<Scalar = L::Scalar>,
    Op: BinaryOp<L::Scalar>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CwiseBinary<{}x{}, `{}`, {}>",
            self.rows(),
            self.cols(),
            Op::SYMBOL,
            <L::Order as StorageOrder>::NAME
        )
    }
}

/// Every coefficient of `inner` multiplied by a scalar
pub struct Scaled<'a, A: DenseBase> {
    inner: &'a A,
    factor: A::Scalar,
}

impl<'a, A: DenseBase> Scaled<'a, A> {
    /// Scale `inner` by `factor`
    pub fn new(inner: &'a A, factor: A::Scalar) -> Self {
        Self { inner, factor }
    }
}

impl<'a, A: DenseBase> DenseBase for Scaled<'a, A> {
    type Scalar = A::Scalar;
    type Kind = Expression;
    type Order = A::Order;
    type PlainObject = A::PlainObject;

    const ROWS: usize = A::ROWS;
    const COLS: usize = A::COLS;

    fn rows(&self) -> usize {
        self.inner.rows()
    }

    fn cols(&self) -> usize {
        self.inner.cols()
    }

    fn coeff(&self, i: usize, j: usize) -> A::Scalar {
        <A::Scalar as Scalar>::mul(self.inner.coeff(i, j), self.factor)
    }
}

impl<'a, A: DenseBase> fmt::Debug for Scaled<'a, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scaled<{}x{}, {:?}>", self.rows(), self.cols(), self.factor)
    }
}

/// Expression-building methods available on every dense aggregate
pub trait DenseExt: DenseBase + Sized {
    /// `self + rhs`
    fn plus<'a, R>(&'a self, rhs: &'a R) -> CwiseBinary<'a, Self, R, Sum>
    where
        R: DenseBase<Scalar = Self::Scalar>,
    {
        CwiseBinary::new(self, rhs, Sum)
    }

    /// `self - rhs`
    fn minus<'a, R>(&'a self, rhs: &'a R) -> CwiseBinary<'a, Self, R, Difference>
    where
        R: DenseBase<Scalar = Self::Scalar>,
    {
        CwiseBinary::new(self, rhs, Difference)
    }

    /// Coefficient-wise `self * rhs`
    fn cwise_product<'a, R>(&'a self, rhs: &'a R) -> CwiseBinary<'a, Self, R, Product>
    where
        R: DenseBase<Scalar = Self::Scalar>,
    {
        CwiseBinary::new(self, rhs, Product)
    }

    /// `self * factor`
    fn scaled(&self, factor: Self::Scalar) -> Scaled<'_, Self> {
        Scaled::new(self, factor)
    }
}

impl<A: DenseBase> DenseExt for A {}
