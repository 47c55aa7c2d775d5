//! Naming of material property derivatives.
//!
//! The derivative of a property `F` with respect to the symbols `c`, `c` and `T` is stored as a
//! separate material property with the name
//! ```text
//!    d^3F/dTdc^2
//! ```
//! that is, the derivative order as an exponent of the numerator and repeated symbols grouped with
//! exponents in the denominator. The zeroth derivative of `F` is `F` itself.
//!
//! Since mixed partial derivatives commute, [`derivative_property_name`] sorts the symbols before
//! building the name, so that any permutation of the same symbols names the same property.
//! The fixed-arity helpers [`derivative_property_name_second`] and
//! [`derivative_property_name_third`] do *not* sort and build the name in the order the symbols
//! are given. Code that needs a canonical name must use the general form.
use itertools::Itertools;
use std::fmt;
use std::fmt::{Display, Formatter, Write};

fn format_derivative_name(base: &str, symbols: &[&str]) -> String {
    let order = symbols.len();
    if order == 0 {
        return base.to_string();
    }

    let mut name = String::with_capacity(base.len() + 4 * order + 4);
    name.push('d');
    if order > 1 {
        // Writing to a String can not fail
        let _ = write!(name, "^{}", order);
    }
    name.push_str(base);
    name.push('/');

    // Consecutive repetitions of a symbol are written with an exponent
    for (symbol, group) in &symbols.iter().group_by(|symbol| **symbol) {
        let exponent = group.count();
        name.push('d');
        name.push_str(symbol);
        if exponent > 1 {
            let _ = write!(name, "^{}", exponent);
        }
    }
    name
}

/// Canonical name of the derivative of `base` with respect to all given symbols.
///
/// The symbols are sorted, so any permutation of `symbols` gives the same name. An empty list of
/// symbols returns `base` unchanged.
pub fn derivative_property_name<S: AsRef<str>>(base: &str, symbols: &[S]) -> String {
    let sorted: Vec<&str> = symbols.iter().map(AsRef::as_ref).sorted_unstable().collect();
    format_derivative_name(base, &sorted)
}

/// Name of the first derivative of `base` with respect to `c1`.
pub fn derivative_property_name_first(base: &str, c1: &str) -> String {
    format_derivative_name(base, &[c1])
}

/// Name of the second derivative with respect to `c1` and `c2`, in the given order.
pub fn derivative_property_name_second(base: &str, c1: &str, c2: &str) -> String {
    format_derivative_name(base, &[c1, c2])
}

/// Name of the third derivative with respect to `c1`, `c2` and `c3`, in the given order.
pub fn derivative_property_name_third(base: &str, c1: &str, c2: &str, c3: &str) -> String {
    format_derivative_name(base, &[c1, c2, c3])
}

/// A base property name together with the multiset of symbols it is differentiated by.
///
/// The symbols are kept sorted, so two names built from permutations of the same symbols
/// compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyName {
    base: String,
    symbols: Vec<String>,
}

impl PropertyName {
    pub fn new<S: AsRef<str>>(base: impl Into<String>, symbols: &[S]) -> Self {
        let symbols = symbols
            .iter()
            .map(|s| s.as_ref().to_string())
            .sorted_unstable()
            .collect();
        Self {
            base: base.into(),
            symbols,
        }
    }

    /// The undifferentiated property.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Derivative order, zero for the property itself.
    pub fn order(&self) -> usize {
        self.symbols.len()
    }

    /// Returns the name of the derivative of this property with respect to one more symbol.
    pub fn with_derivative(&self, symbol: impl Into<String>) -> Self {
        let mut symbols = self.symbols.clone();
        let symbol = symbol.into();
        let idx = symbols.partition_point(|s| s <= &symbol);
        symbols.insert(idx, symbol);
        Self {
            base: self.base.clone(),
            symbols,
        }
    }

    /// The canonical property name, as produced by [`derivative_property_name`].
    pub fn canonical(&self) -> String {
        derivative_property_name(&self.base, &self.symbols)
    }
}

impl Display for PropertyName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}
