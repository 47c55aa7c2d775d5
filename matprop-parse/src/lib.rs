//! Tiny parser for material property expressions.
//!
//! Physics objects refer to material properties (and their derivatives) through short textual
//! expressions embedded in input files. The accepted forms are
//!
//! ```text
//!    F                  the property F
//!    F(c,T)             the property F, which depends on the symbols c and T
//!    D[F(c,T),c,c]      the second derivative of F with respect to c
//!    Old[F]             the value of F at the previous time step
//!    Older[F]           the value of F two time steps back
//!    phi:=D[x(t),t]     any of the above, referred to by the alias `phi`
//! ```
//!
//! Note that the differentiation list of `D[...]` is closed by the final `]`, the list of
//! dependent symbols of the function by `)`.
//!
//! It is used by `fenris-matprop` to build property descriptors, which are further tested there.

use core::fmt;
use core::fmt::{Display, Formatter};

/// Temporal state of a property expression.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TimeState {
    Current,
    Old,
    Older,
}

impl Default for TimeState {
    fn default() -> Self {
        TimeState::Current
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    error: String,
}

impl ParseError {
    fn from_string(error: String) -> Self {
        Self { error }
    }

    fn malformed(expression: &str, reason: &str) -> Self {
        ParseError::from_string(format!(
            "Malformed material property expression '{}': {}",
            expression, reason
        ))
    }

    fn invalid_identifier(expression: &str, label: &str, identifier: &str) -> Self {
        ParseError::from_string(format!(
            "Malformed material property expression '{}': '{}' is not a valid {}",
            expression, identifier, label
        ))
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for ParseError {}

/// The parts of a parsed property expression.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyExpression {
    /// The symbol the property is referred to by in a function expression.
    ///
    /// This is the alias given with `:=`, or the base name if no alias is given.
    pub symbol: String,
    /// Name of the undifferentiated property.
    pub base_name: String,
    /// Symbols the property depends on, sorted and without duplicates.
    pub dependent_symbols: Vec<String>,
    /// Symbols the property is differentiated with respect to, in the order given.
    pub derivative_symbols: Vec<String>,
    pub state: TimeState,
}

const RESERVED_CHARACTERS: &[char] = &['[', ']', '(', ')', ',', ':', '='];

fn check_identifier(expression: &str, label: &str, identifier: &str) -> Result<(), ParseError> {
    let valid = !identifier.is_empty()
        && !identifier
            .chars()
            .any(|c| c.is_whitespace() || RESERVED_CHARACTERS.contains(&c));
    if valid {
        Ok(())
    } else {
        Err(ParseError::invalid_identifier(expression, label, identifier))
    }
}

/// Splits a comma separated list, skipping empty entries.
fn tokenize<'a>(expression: &str, list: &'a str, label: &str) -> Result<Vec<&'a str>, ParseError> {
    let tokens: Vec<_> = list
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect();
    for token in &tokens {
        check_identifier(expression, label, token)?;
    }
    Ok(tokens)
}

/// Parses an expression of the form `name` or `name(arg1,arg2,...)`.
///
/// Returns the name and the sorted list of arguments with duplicates removed.
pub fn parse_dependent_symbols(expression: &str) -> Result<(String, Vec<String>), ParseError> {
    let expression = expression.trim();
    match (expression.find('('), expression.rfind(')')) {
        (None, None) => {
            check_identifier(expression, "property name", expression)?;
            Ok((expression.to_string(), Vec::new()))
        }
        (Some(open), Some(close)) if open < close => {
            if !expression[close + 1..].trim().is_empty() {
                return Err(ParseError::malformed(expression, "unexpected text after ')'"));
            }
            let name = expression[..open].trim();
            check_identifier(expression, "property name", name)?;
            let mut symbols: Vec<String> = tokenize(expression, &expression[open + 1..close], "symbol")?
                .into_iter()
                .map(String::from)
                .collect();
            symbols.sort_unstable();
            symbols.dedup();
            Ok((name.to_string(), symbols))
        }
        _ => Err(ParseError::malformed(expression, "unbalanced parentheses")),
    }
}

/// Attempts to parse a material property expression.
///
/// See the crate documentation for the accepted forms.
pub fn parse_expression(expression: &str) -> Result<PropertyExpression, ParseError> {
    let expression = expression.trim();
    match expression.split_once(":=") {
        Some((alias, rhs)) => {
            let alias = alias.trim();
            check_identifier(expression, "alias", alias)?;
            let mut parsed = parse_derivative(expression, rhs.trim())?;
            parsed.symbol = alias.to_string();
            Ok(parsed)
        }
        None => {
            let mut parsed = parse_derivative(expression, expression)?;
            parsed.symbol = parsed.base_name.clone();
            Ok(parsed)
        }
    }
}

fn parse_derivative(expression: &str, rhs: &str) -> Result<PropertyExpression, ParseError> {
    let (open, close) = match (rhs.find('['), rhs.rfind(']')) {
        (None, None) => {
            let (base_name, dependent_symbols) = parse_dependent_symbols(rhs)
                .map_err(|_| ParseError::malformed(expression, "invalid property or argument list"))?;
            return Ok(PropertyExpression {
                base_name,
                dependent_symbols,
                ..Default::default()
            });
        }
        (Some(open), Some(close)) if open < close => (open, close),
        _ => return Err(ParseError::malformed(expression, "unbalanced brackets")),
    };

    if !rhs[close + 1..].trim().is_empty() {
        return Err(ParseError::malformed(expression, "unexpected text after ']'"));
    }

    let inner = &rhs[open + 1..close];
    match rhs[..open].trim() {
        "Old" => parse_previous_state(expression, inner, TimeState::Old),
        "Older" => parse_previous_state(expression, inner, TimeState::Older),
        "D" => {
            let (function, derivatives) = match inner.rfind(')') {
                // D[F,c,c]: the first entry is the function, the rest are derivative symbols
                None => {
                    let tokens = tokenize(expression, inner, "symbol")?;
                    match tokens.split_first() {
                        Some((function, derivatives)) => (*function, derivatives.to_vec()),
                        None => return Err(ParseError::malformed(expression, "empty derivative D[]")),
                    }
                }
                // D[F(c,T),c,c]: the function carries its own argument list
                Some(close_args) => {
                    let rest = inner[close_args + 1..].trim();
                    let derivatives = match rest.strip_prefix(',') {
                        Some(list) => tokenize(expression, list, "derivative symbol")?,
                        None if rest.is_empty() => Vec::new(),
                        None => return Err(ParseError::malformed(expression, "expected ',' after ')'")),
                    };
                    (&inner[..=close_args], derivatives)
                }
            };
            let (base_name, dependent_symbols) = parse_dependent_symbols(function)
                .map_err(|_| ParseError::malformed(expression, "invalid function in D[]"))?;
            Ok(PropertyExpression {
                base_name,
                dependent_symbols,
                derivative_symbols: derivatives.into_iter().map(String::from).collect(),
                ..Default::default()
            })
        }
        other => Err(ParseError::malformed(
            expression,
            &format!("unknown operator '{}', expected one of D, Old, Older", other),
        )),
    }
}

fn parse_previous_state(expression: &str, inner: &str, state: TimeState) -> Result<PropertyExpression, ParseError> {
    // Old and older values can not be differentiated further, so dependencies are dropped
    let (base_name, _) = parse_dependent_symbols(inner)
        .map_err(|_| ParseError::malformed(expression, "invalid property in Old[]/Older[]"))?;
    Ok(PropertyExpression {
        base_name,
        state,
        ..Default::default()
    })
}
