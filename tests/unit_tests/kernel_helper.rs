use super::function_material::double_well_material;
use super::{kernel, N_QP};
use fenris_matprop::kernel_helper::DerivativeKernelHelper;
use fenris_matprop::parameters::InputParameters;
use fenris_matprop::value::Real;
use fenris_matprop::warehouse::{EvaluationContext, PropertyProvider};
use std::sync::Arc;
use util::assert_property_values;

fn evaluate_double_well(registry: &Arc<fenris_matprop::MaterialPropertyRegistry>) {
    let material = double_well_material(registry, InputParameters::new().with("derivative_order", 2_i64)).unwrap();
    let context = EvaluationContext::new(N_QP)
        .with_uniform_field("c", 2.0)
        .with_uniform_field("eta", 0.5);
    material.compute_properties(&context).unwrap();
}

#[test]
fn fetches_derivatives_for_coupled_and_acting_variables() {
    let registry = super::registry();
    evaluate_double_well(&registry);

    let parameters = InputParameters::new().with("f_name", "F");
    let interface = Arc::new(kernel("ch_kernel", &registry, "c", &["eta"], parameters));
    let helper = DerivativeKernelHelper::new(interface, "f_name").unwrap();
    assert_eq!(helper.property_name(), "F");
    assert_eq!(helper.arguments(), &["eta"]);

    // c = 2, eta = 0.5
    assert_property_values!(helper.first_derivative(0), N_QP, 4.0 + 0.75);
    assert_property_values!(helper.second_derivative(0, 0), N_QP, 3.0);
    assert_property_values!(helper.variable_derivative().unwrap(), N_QP, 2.0);
    assert_property_values!(helper.variable_second_derivative().unwrap(), N_QP, 1.0);
    assert_property_values!(helper.variable_mixed_derivative(0).unwrap(), N_QP, 4.0);
    assert!(helper.first_derivative_by_name("eta").is_some());
    assert!(helper.first_derivative_by_name("c").is_none());

    assert!(helper.initial_setup().unwrap().is_complete());
}

#[test]
fn derivatives_without_provider_are_zero() {
    let registry = super::registry();
    evaluate_double_well(&registry);

    // Derivatives with respect to `a` are not provided
    let interface = Arc::new(kernel("kernel", &registry, "a", &["c", "b"], InputParameters::new()));
    let helper = DerivativeKernelHelper::new(interface, "F").unwrap();
    assert!(!helper.first_derivative(0).is_zero());
    assert!(helper.first_derivative(1).is_zero());
    assert!(helper.second_derivative(0, 1).is_zero());
    assert!(helper.variable_derivative().unwrap().is_zero());
    assert_property_values!(helper.variable_mixed_derivative(1).unwrap(), N_QP, 0.0);

    // The kernel is not coupled to `eta`, which F depends on
    let validation = helper.initial_setup().unwrap();
    assert_eq!(validation.missing_variables(), &["eta"]);
}

#[test]
fn helper_without_acting_variable() {
    let registry = super::registry();
    evaluate_double_well(&registry);
    let interface = Arc::new(super::material("mat", &registry, &["c", "eta"]));
    let helper = DerivativeKernelHelper::new(interface, "F").unwrap();
    assert!(helper.variable_derivative().is_none());
    assert!(helper.variable_mixed_derivative(0).is_none());
    assert_property_values!(helper.second_derivative(0, 1), N_QP, 4.0);
    assert_property_values!(helper.second_derivative(1, 0), N_QP, 4.0);
}

#[test]
fn constant_property_has_zero_derivatives() {
    let registry = super::registry();
    let parameters = InputParameters::new().with("f_name", 3.0);
    let interface = Arc::new(kernel("kernel", &registry, "u", &["c"], parameters));
    let helper = DerivativeKernelHelper::new(interface, "f_name").unwrap();
    assert_eq!(helper.property_name(), "3");
    assert!(helper.first_derivative(0).is_zero());
    // An empty registry skips coupling validation
    assert!(helper.initial_setup().unwrap().is_complete());
    let _: Real = helper.second_derivative(0, 0).value(0);
}
