//! Type- and unit-compatibility helpers used at registration wiring time
//! (spec §6), grounded in HELICS's `checkTypeMatch`/`checkUnitMatch`.

/// Types that are considered mutually convertible in non-strict matching.
const CONVERTIBLE_SET: &[&str] = &[
    "double_vector",
    "complex_vector",
    "vector",
    "double",
    "float",
    "bool",
    "char",
    "uchar",
    "int32",
    "int64",
    "uint32",
    "uint64",
    "int16",
    "string",
    "complex",
    "complex_f",
    "named_point",
];

fn is_wildcard_type(t: &str) -> bool {
    t.is_empty() || t == "def" || t == "any"
}

/// Does `type1` (the declared/consuming side) accept `type2`?
///
/// Note this function is *not* symmetric in strict mode by construction (the
/// left-hand side is privileged as the declared type), but non-strict
/// matching is symmetric for any pair drawn from [`CONVERTIBLE_SET`] — see
/// the `type_match_symmetry` test (testable property 9).
pub fn check_type_match(type1: &str, type2: &str, strict_match: bool) -> bool {
    if type1.is_empty() || type1 == type2 || type1 == "def" || type1 == "any" || type1 == "raw" {
        return true;
    }
    if strict_match {
        return false;
    }
    if is_wildcard_type(type2) {
        return true;
    }
    if CONVERTIBLE_SET.contains(&type1) {
        return CONVERTIBLE_SET.contains(&type2);
    }
    type2 == "raw"
}

/// Merge two declared types for a multi-source input per spec §4.2: the
/// first source seen establishes the type; any later disagreement degrades
/// it to the "multi" sentinel.
pub fn merge_type(existing: Option<&str>, incoming: &str) -> String {
    match existing {
        None => incoming.to_owned(),
        Some(t) if t == incoming => t.to_owned(),
        Some("multi") => "multi".to_owned(),
        Some(_) => "multi".to_owned(),
    }
}

/// A minimal unit table: bare dimension name plus an SI-prefix-free scale
/// factor within that dimension. This is intentionally not a full units
/// library (no example in the retrieval pack pulls one in, and spec §6 scopes
/// out unit *conversion*, only *matching*) — just enough structure to decide
/// whether two unit strings are convertible, and at what ratio for strict
/// ("quick") matching.
fn parse_unit(unit: &str) -> Option<(&'static str, f64)> {
    let table: &[(&str, &str, f64)] = &[
        ("m", "length", 1.0),
        ("meter", "length", 1.0),
        ("meters", "length", 1.0),
        ("km", "length", 1000.0),
        ("cm", "length", 0.01),
        ("mm", "length", 0.001),
        ("ft", "length", 0.3048),
        ("s", "time", 1.0),
        ("sec", "time", 1.0),
        ("ms", "time", 0.001),
        ("min", "time", 60.0),
        ("hr", "time", 3600.0),
        ("W", "power", 1.0),
        ("kW", "power", 1000.0),
        ("MW", "power", 1_000_000.0),
        ("V", "voltage", 1.0),
        ("kV", "voltage", 1000.0),
        ("A", "current", 1.0),
        ("Hz", "frequency", 1.0),
        ("degC", "temperature", 1.0),
        ("K", "temperature", 1.0),
        ("rad", "angle", 1.0),
        ("deg", "angle", std::f64::consts::PI / 180.0),
    ];
    table
        .iter()
        .find(|(name, ..)| *name == unit)
        .map(|(_, dim, scale)| (*dim, *scale))
}

/// Does `unit1` match `unit2`? Mirrors HELICS's `checkUnitMatch`: empty/`def`/`any`
/// trivially match; otherwise both must parse and be convertible (or, in
/// strict mode, convertible by a simple fixed ratio within the same
/// dimension — "quick_convert" in the original).
pub fn check_unit_match(unit1: &str, unit2: &str, strict_match: bool) -> bool {
    if unit1.is_empty() || unit1 == unit2 || unit1 == "def" || unit1 == "any" {
        return true;
    }
    if unit2.is_empty() || unit2 == "def" || unit2 == "any" {
        return true;
    }
    let Some((dim1, scale1)) = parse_unit(unit1) else {
        return false;
    };
    let Some((dim2, scale2)) = parse_unit(unit2) else {
        return false;
    };
    if dim1 != dim2 {
        return false;
    }
    if strict_match {
        // "quick" conversion only allows a unit exactly equal to itself or a
        // same-scale alias; anything requiring an actual scale factor fails.
        return (scale1 - scale2).abs() < f64::EPSILON;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_wildcard_types_match_everything() {
        assert!(check_type_match("", "double", false));
        assert!(check_type_match("any", "string", false));
        assert!(check_type_match("raw", "complex", false));
    }

    #[test]
    fn raw_is_a_sink_in_non_strict_mode() {
        assert!(check_type_match("custom_blob", "raw", false));
        assert!(!check_type_match("custom_blob", "raw", true));
    }

    #[test]
    fn type_match_symmetry_within_convertible_set() {
        for &a in CONVERTIBLE_SET {
            for &b in CONVERTIBLE_SET {
                assert_eq!(
                    check_type_match(a, b, false),
                    check_type_match(b, a, false),
                    "asymmetric for ({a}, {b})"
                );
            }
        }
    }

    #[test]
    fn unit_wildcards_match() {
        assert!(check_unit_match("", "m", false));
        assert!(check_unit_match("any", "kW", false));
    }

    #[test]
    fn unit_convertible_same_dimension() {
        assert!(check_unit_match("m", "km", false));
        assert!(!check_unit_match("m", "s", false));
    }

    #[test]
    fn unit_strict_requires_equal_scale() {
        assert!(check_unit_match("m", "meter", true));
        assert!(!check_unit_match("m", "km", true));
    }

    #[test]
    fn unparseable_unit_fails() {
        assert!(!check_unit_match("bogus-unit", "m", false));
    }
}
