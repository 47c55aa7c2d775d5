//! Assertion helpers for tests.

/// Poor man's approx assertion for matrices
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let diff = $x - $y;

        let max_absdiff = diff.abs().max();
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {}", $x);
            println!("right: {}", $y);
            println!("diff: {:e}", diff);
        }
        assert!(approx_eq);
    }};
}

/// Asserts that every quadrature point value of a property handle equals the expected value.
#[macro_export]
macro_rules! assert_property_values {
    ($property:expr, $n_qp:expr, $expected:expr) => {{
        let property = &$property;
        for qp in 0..$n_qp {
            let value = property.value(qp);
            if value != $expected {
                panic!(
                    "Property '{}' has value {:?} at quadrature point {}, expected {:?}",
                    property.name(),
                    value,
                    qp,
                    $expected
                );
            }
        }
    }};
}
