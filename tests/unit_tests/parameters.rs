use fenris_matprop::parameters::{InputParameters, MaterialPropertyName, ParameterValue};
use fenris_matprop::value::Real;
use insta::assert_snapshot;

fn load(json: &str) -> InputParameters {
    serde_json::from_str(json).unwrap()
}

#[test]
fn parameters_load_from_json() {
    let parameters = load(
        r#"{
            "f_name": "F",
            "coupled_variables": ["c", "eta"],
            "derivative_order": 2,
            "kappa": 0.5,
            "use_displaced_mesh": false,
            "coefficients": [1.0, 2.5]
        }"#,
    );
    assert_eq!(parameters.get::<String>("f_name").unwrap(), "F");
    assert_eq!(
        parameters.get::<Vec<String>>("coupled_variables").unwrap(),
        vec!["c".to_string(), "eta".to_string()]
    );
    assert_eq!(parameters.get::<usize>("derivative_order").unwrap(), 2);
    assert_eq!(parameters.get::<i64>("derivative_order").unwrap(), 2);
    assert_eq!(parameters.get::<Real>("derivative_order").unwrap(), 2.0);
    assert_eq!(parameters.get::<Real>("kappa").unwrap(), 0.5);
    assert!(!parameters.get::<bool>("use_displaced_mesh").unwrap());
    assert_eq!(parameters.get::<Vec<Real>>("coefficients").unwrap(), vec![1.0, 2.5]);
    assert_eq!(parameters.raw("kappa"), Some(&ParameterValue::Real(0.5)));
    assert_eq!(
        parameters.keys().collect::<Vec<_>>(),
        vec!["coefficients", "coupled_variables", "derivative_order", "f_name", "kappa", "use_displaced_mesh"]
    );
}

#[test]
fn parameters_round_trip_through_json() {
    let parameters = InputParameters::new()
        .with("f_name", "F")
        .with("args", ["c", "T"])
        .with("order", 3_i64);
    let json = serde_json::to_string(&parameters).unwrap();
    assert_eq!(json, r#"{"args":["c","T"],"f_name":"F","order":3}"#);
    assert_eq!(load(&json), parameters);
}

#[test]
fn optional_and_default_parameters() {
    let mut parameters = InputParameters::new();
    parameters.set("order", 2_i64);
    assert!(parameters.contains("order"));
    assert_eq!(parameters.get_optional::<usize>("order").unwrap(), Some(2));
    assert_eq!(parameters.get_optional::<usize>("missing").unwrap(), None);
    assert_eq!(parameters.get_or::<usize>("missing", 3).unwrap(), 3);
    assert_eq!(parameters.get_or::<usize>("order", 3).unwrap(), 2);
}

#[test]
fn parameter_errors_name_the_parameter() {
    let parameters = InputParameters::new().with("order", -1_i64).with("name", "F");

    let err = parameters.get::<String>("missing").unwrap_err();
    assert_snapshot!(err.to_string(), @"Missing required parameter 'missing'");

    let err = parameters.get::<usize>("order").unwrap_err();
    assert_snapshot!(err.to_string(), @"Parameter 'order' is of type integer, but non-negative integer was expected");

    let err = parameters.get::<Vec<Real>>("name").unwrap_err();
    assert_snapshot!(err.to_string(), @"Parameter 'name' is of type string, but real list was expected");
}

#[test]
fn single_string_is_a_list_of_one() {
    let parameters = InputParameters::new().with("args", "c");
    assert_eq!(parameters.get::<Vec<String>>("args").unwrap(), vec!["c".to_string()]);
}

#[test]
fn property_names_may_be_numeric_constants() {
    let parameters = load(r#"{ "mob_name": "M", "kappa_name": 2.5, "d_name": "1e-3", "n_name": 4 }"#);

    let mobility: MaterialPropertyName = parameters.get("mob_name").unwrap();
    assert_eq!(mobility.as_str(), "M");
    assert_eq!(mobility.constant_value(), None);

    let kappa: MaterialPropertyName = parameters.get("kappa_name").unwrap();
    assert_eq!(kappa.constant_value(), Some(2.5));

    let diffusivity: MaterialPropertyName = parameters.get("d_name").unwrap();
    assert_eq!(diffusivity.constant_value(), Some(1e-3));

    let n: MaterialPropertyName = parameters.get("n_name").unwrap();
    assert_eq!(n.constant_value(), Some(4.0));
}

#[test]
fn list_parameters_of_equal_length() {
    let parameters = InputParameters::new()
        .with("args", ["a", "b"])
        .with("coefficients", vec![1.0, 2.0])
        .with("other", ["c"])
        .with("scalar", 1.0);

    assert!(parameters.check_equal_lengths("args", "coefficients").is_ok());
    assert!(parameters.check_equal_lengths("missing1", "missing2").is_ok());

    let err = parameters.check_equal_lengths("args", "other").unwrap_err();
    assert_snapshot!(
        err.to_string(),
        @"Parameters 'args' and 'other' must have the same number of entries, but have 2 and 1"
    );

    let err = parameters.check_equal_lengths("args", "scalar").unwrap_err();
    assert_snapshot!(err.to_string(), @"Parameter 'scalar' is of type real, but a list was expected");
}
