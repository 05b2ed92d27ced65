use std::collections::BTreeMap;

/// Scalar feature property. Upstream sources are inconsistent about
/// numeric typing (USGS magnitudes arrive as numbers, some grids as
/// strings), so `as_number` also accepts numeric text.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Number(f64),
    Text(String),
}

impl PropertyValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            PropertyValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            PropertyValue::Number(_) => None,
        }
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Integral numbers print without the trailing ".0".
            PropertyValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            PropertyValue::Number(n) => write!(f, "{n}"),
            PropertyValue::Text(s) => write!(f, "{s}"),
        }
    }
}

pub type Properties = BTreeMap<String, PropertyValue>;

/// First non-missing numeric value among candidate property names.
///
/// Sources disagree on names for the same concept (`magnitude` vs `mag`,
/// `location` vs `place`); lookups always go through a fixed priority list.
pub fn first_number(props: &Properties, candidates: &[&str]) -> Option<f64> {
    candidates
        .iter()
        .find_map(|name| props.get(*name).and_then(PropertyValue::as_number))
}

/// First non-missing text value among candidate property names.
pub fn first_text<'p>(props: &'p Properties, candidates: &[&str]) -> Option<&'p str> {
    candidates
        .iter()
        .find_map(|name| props.get(*name).and_then(PropertyValue::as_text))
}

/// First non-missing value of either kind, rendered as display text.
pub fn first_display(props: &Properties, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find_map(|name| props.get(*name).map(|v| v.to_string()))
}
