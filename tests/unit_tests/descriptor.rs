use super::{kernel, material, variables, N_QP};
use fenris_matprop::descriptor::FunctionMaterialPropertyDescriptor;
use fenris_matprop::interface::{DerivativeMaterialInterface, ObjectKind};
use fenris_matprop::parameters::InputParameters;
use fenris_matprop::property::PropertyState;
use fenris_matprop::value::Real;
use insta::assert_snapshot;
use std::sync::Arc;

fn owner() -> Arc<DerivativeMaterialInterface> {
    Arc::new(material("function_mat", &super::registry(), &["c", "T"]))
}

fn parse(expression: &str) -> FunctionMaterialPropertyDescriptor {
    FunctionMaterialPropertyDescriptor::new(expression, &owner(), false).unwrap()
}

#[test]
fn plain_property() {
    let descriptor = parse("F");
    assert_eq!(descriptor.symbol_name(), "F");
    assert_eq!(descriptor.base_name(), "F");
    assert!(descriptor.dependent_symbols().is_empty());
    assert!(descriptor.derivative_symbols().is_empty());
    assert_eq!(descriptor.state(), PropertyState::Current);
    assert_eq!(descriptor.property_name(), "F");
}

#[test]
fn property_with_dependent_symbols() {
    let descriptor = parse("F(c,T)");
    assert_eq!(descriptor.base_name(), "F");
    assert_eq!(descriptor.dependent_symbols(), &["T", "c"]);
    assert_eq!(descriptor.state(), PropertyState::Current);
    assert!(descriptor.depends_on("c"));
    assert!(!descriptor.depends_on("eta"));
}

#[test]
fn derivative_property() {
    let descriptor = parse("D[F(c),c]");
    assert_eq!(descriptor.base_name(), "F");
    assert_eq!(descriptor.dependent_symbols(), &["c"]);
    assert_eq!(descriptor.derivative_symbols(), &["c"]);
    assert_eq!(descriptor.state(), PropertyState::Current);
    assert_eq!(descriptor.property_name(), "dF/dc");

    let descriptor = parse("D[F(c,T),T,c,c]");
    assert_eq!(descriptor.property_name(), "d^3F/dTdc^2");
}

#[test]
fn old_property() {
    let descriptor = parse("Old[F]");
    assert_eq!(descriptor.base_name(), "F");
    assert_eq!(descriptor.state(), PropertyState::Old);
    assert!(descriptor.dependent_symbols().is_empty());

    let descriptor = parse("Older[F(c)]");
    assert_eq!(descriptor.state(), PropertyState::Older);
    assert!(descriptor.dependent_symbols().is_empty());
}

#[test]
fn aliased_derivative() {
    let descriptor = parse("phi:=D[x(t),t]");
    assert_eq!(descriptor.symbol_name(), "phi");
    assert_eq!(descriptor.base_name(), "x");
    assert_eq!(descriptor.dependent_symbols(), &["t"]);
    assert_eq!(descriptor.derivative_symbols(), &["t"]);
    assert!(descriptor.depends_on("t"));
}

#[test]
fn malformed_expression_is_an_error() {
    let err = FunctionMaterialPropertyDescriptor::new("D[F", &owner(), false).unwrap_err();
    assert_snapshot!(err.to_string(), @"Invalid material property expression in 'function_mat'");
    assert_snapshot!(
        err.root_cause().to_string(),
        @"Malformed material property expression 'D[F': unbalanced brackets"
    );

    assert!(FunctionMaterialPropertyDescriptor::new("Integral[F]", &owner(), false).is_err());
}

#[test]
fn parse_vector_parses_every_expression() {
    let descriptors =
        FunctionMaterialPropertyDescriptor::parse_vector(&["F", "G(c)", "h:=Old[H]"], &owner(), true).unwrap();
    let symbols: Vec<_> = descriptors.iter().map(|d| d.symbol_name()).collect();
    assert_eq!(symbols, vec!["F", "G", "h"]);
    assert!(descriptors.iter().all(|d| d.is_required()));

    assert!(FunctionMaterialPropertyDescriptor::parse_vector(&["F", "D[G"], &owner(), true).is_err());
}

#[test]
fn display_gives_parsable_expression() {
    for expression in ["F", "F(T,c)", "D[F(T,c),c,c]", "D[F,c]", "Old[F]", "Older[F]", "phi:=D[x(t),t]"] {
        let descriptor = parse(expression);
        assert_eq!(descriptor.to_string(), expression);
        let reparsed = parse(&descriptor.to_string());
        assert_eq!(reparsed.property_name(), descriptor.property_name());
    }
}

#[test]
fn optional_property_resolves_to_declared_derivative() {
    let registry = super::registry();
    let mat = material("mat", &registry, &["c"]);
    let derivative = mat.declare_property_derivative::<Real, _>("F", &["c"]).unwrap();
    derivative.fill_with(|qp| 10.0 + qp as Real);

    let owner = Arc::new(kernel("kernel", &registry, "u", &["c"], InputParameters::new()));
    let descriptor = FunctionMaterialPropertyDescriptor::new("D[F(c),c]", &owner, false).unwrap();
    assert_eq!(descriptor.value(2), 12.0);
    assert_eq!(descriptor.try_value(3).unwrap(), 13.0);
    assert!(descriptor.resolve().unwrap().shares_storage_with(&derivative.as_property()));
}

#[test]
fn optional_missing_property_is_zero() {
    let registry = super::registry();
    let owner = Arc::new(kernel("kernel", &registry, "u", &["c"], InputParameters::new()));
    let descriptor = FunctionMaterialPropertyDescriptor::new("D[F(c),c,c]", &owner, false).unwrap();
    for qp in 0..N_QP {
        assert_eq!(descriptor.value(qp), 0.0);
    }
    assert!(descriptor.resolve().unwrap().is_zero());
    assert!(registry.check_requested_properties().is_ok());
}

#[test]
fn required_property_is_requested() {
    let registry = super::registry();
    let owner = Arc::new(material("function_mat", &registry, &["c"]));
    let descriptor = FunctionMaterialPropertyDescriptor::new("D[F(c),c]", &owner, true).unwrap();
    let property = descriptor.resolve().unwrap().clone();
    assert!(!property.is_zero());
    assert!(registry.check_requested_properties().is_err());

    let provider = material("mat", &registry, &["c"]);
    provider
        .declare_property_derivative::<Real, _>("F", &["c"])
        .unwrap()
        .fill_with(|_| 4.0);
    assert!(registry.check_requested_properties().is_ok());
    assert_eq!(descriptor.value(1), 4.0);
}

#[test]
fn adding_a_derivative_invalidates_resolved_property() {
    let registry = super::registry();
    let mat = material("mat", &registry, &["c"]);
    mat.declare_property::<Real>("F").unwrap().fill_with(|_| 1.0);
    mat.declare_property_derivative::<Real, _>("F", &["c"])
        .unwrap()
        .fill_with(|_| 2.0);
    mat.declare_property_derivative::<Real, _>("F", &["c", "c"])
        .unwrap()
        .fill_with(|_| 3.0);

    let owner = Arc::new(kernel("kernel", &registry, "u", &["c"], InputParameters::new()));
    let mut descriptor = FunctionMaterialPropertyDescriptor::new("F(c)", &owner, false).unwrap();
    assert_eq!(descriptor.value(0), 1.0);
    descriptor.add_derivative("c");
    assert_eq!(descriptor.property_name(), "dF/dc");
    assert_eq!(descriptor.value(0), 2.0);

    let mut second = descriptor.clone();
    second.add_derivative("c");
    assert_eq!(second.value(0), 3.0);
    assert_eq!(descriptor.value(0), 2.0);
}

#[test]
fn old_property_resolves_to_previous_time_step() {
    let registry = super::registry();
    let mat = material("mat", &registry, &[]);
    let current = mat.declare_property::<Real>("F").unwrap();

    let owner = Arc::new(kernel("kernel", &registry, "u", &[], InputParameters::new()));
    let old = FunctionMaterialPropertyDescriptor::new("Old[F]", &owner, false).unwrap();
    old.resolve().unwrap();
    current.fill_with(|_| 7.0);
    registry.advance_time_step();
    current.fill_with(|_| 8.0);
    assert_eq!(old.value(0), 7.0);
}

#[test]
#[should_panic(expected = "Don't take derivatives of old/older properties")]
fn derivatives_of_old_properties_panic() {
    let mut descriptor = parse("Old[F]");
    descriptor.add_derivative("c");
    descriptor.value(0);
}

#[test]
fn owner_must_be_material_or_kernel() {
    let registry = super::registry();
    let owner = Arc::new(
        DerivativeMaterialInterface::builder("postprocessor", registry, variables())
            .with_kind(ObjectKind::Other)
            .build(),
    );
    let descriptor = FunctionMaterialPropertyDescriptor::new("F", &owner, false).unwrap();
    let err = descriptor.resolve().unwrap_err();
    assert_snapshot!(
        err.to_string(),
        @"postprocessor: material property expression 'F' can only be used in materials and kernels, not in Other"
    );
}

#[test]
fn construction_records_dependency() {
    let registry = super::registry();
    let owner = Arc::new(kernel("kernel", &registry, "u", &["c"], InputParameters::new()));
    let mut derivative = FunctionMaterialPropertyDescriptor::new("D[F(c),c]", &owner, false).unwrap();
    let _old = FunctionMaterialPropertyDescriptor::new("Old[G]", &owner, false).unwrap();
    let _constant = FunctionMaterialPropertyDescriptor::new("2.5", &owner, true).unwrap();
    assert_eq!(owner.consumed_property_names(), vec!["G", "dF/dc"]);

    derivative.add_derivative("c");
    assert_eq!(owner.consumed_property_names(), vec!["G", "d^2F/dc^2", "dF/dc"]);
    // Nothing is requested until the descriptors are used
    assert!(!registry.contains("dF/dc"));
    assert!(registry.check_requested_properties().is_ok());
}

#[test]
fn required_property_is_checked_before_first_use() {
    let registry = super::registry();
    let owner = Arc::new(material("function_mat", &registry, &["c"]));
    let _descriptor = FunctionMaterialPropertyDescriptor::new("Nope", &owner, true).unwrap();
    let err = registry.check_requested_properties().unwrap_err();
    assert_snapshot!(
        err.to_string(),
        @"Material properties requested but never declared: 'Nope' (requested by 'function_mat')"
    );

    let provider = material("mat", &registry, &[]);
    provider.declare_property::<Real>("Nope").unwrap();
    assert!(registry.check_requested_properties().is_ok());
}
