//! Value types that can be stored in material properties.
use crate::nalgebra::{Matrix2, Matrix3, Vector2, Vector3};
use num::Zero;
use std::fmt::Debug;

pub type Real = f64;

/// A vector-valued property, e.g. a diffusive flux.
pub type RealVectorValue = Vector3<Real>;

/// A rank two tensor-valued property, e.g. a stress or a mobility tensor.
pub type RankTwoTensor = Matrix3<Real>;

/// A value that can be stored per quadrature point in a material property.
///
/// The zero of the type is what a zero property evaluates to.
pub trait PropertyValue: Clone + Zero + Debug + Send + Sync + 'static {
    /// Constructs a constant value from a numeric literal given in place of a property name.
    ///
    /// Only scalar properties accept numeric literals, for other types this returns `None` and the
    /// literal is treated as a property name.
    fn from_constant(_value: Real) -> Option<Self> {
        None
    }
}

impl PropertyValue for Real {
    fn from_constant(value: Real) -> Option<Self> {
        Some(value)
    }
}

macro_rules! impl_property_value {
    ($($ty:ty),*) => {
        $(impl PropertyValue for $ty {})*
    };
}

impl_property_value!(Vector2<Real>, Vector3<Real>, Matrix2<Real>, Matrix3<Real>);
