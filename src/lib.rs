//! Named material properties and their derivatives for finite element physics objects.
//!
//! Materials compute properties (scalars, vectors or tensors) at the quadrature points of an
//! element. Kernels and other physics objects consume them by name. The derivative of a property
//! with respect to coupled variables is itself a property, named by a canonical convention (see
//! [`name`]), so providers and consumers can agree on derivatives without knowing of each other.
//!
//! The main entry point for physics objects is
//! [`DerivativeMaterialInterface`](interface::DerivativeMaterialInterface).

pub mod descriptor;
pub mod function_material;
pub mod interface;
pub mod kernel_helper;
pub mod name;
pub mod parameters;
pub mod property;
pub mod registry;
pub mod restriction;
pub mod value;
pub mod variables;
pub mod warehouse;

pub extern crate matprop_parse;
pub extern crate nalgebra;

pub use interface::{CouplingValidation, DerivativeMaterialInterface, ObjectKind};
pub use property::{MaterialProperty, MaterialPropertyMut, PropertyState};
pub use registry::MaterialPropertyRegistry;
pub use value::{PropertyValue, Real};
