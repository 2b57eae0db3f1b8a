//! Classify a plain scalar's lexical type without consulting anything but
//! its own bytes.
//!
//! Grounded on the `yaml.org,2002` core schema
//! (`tag:yaml.org,2002:{null,bool,int,float}` regexes), the same resolution
//! other YAML-to-native-value libraries run before tagging a scalar;
//! implemented here as a single forward scan with no backtracking, depending
//! only on `s`.

/// The lexical classification of a plain scalar.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TypeHint {
    Null,
    Bool,
    Int,
    Float,
    /// `.inf`, `.Inf`, `.INF`, optionally signed.
    Inf { negative: bool },
    /// `.nan`, `.NaN`, `.NAN`.
    NaN,
    Unknown,
}

const NULLS: &[&str] = &["~", "null", "Null", "NULL"];
const TRUES: &[&str] = &[
    "true", "True", "TRUE", "yes", "Yes", "YES", "on", "On", "ON", "y", "Y",
];
const FALSES: &[&str] = &[
    "false", "False", "FALSE", "no", "No", "NO", "off", "Off", "OFF", "n", "N",
];

/// Classify `s` as one plain-scalar lexical type. Pure: depends only on `s`.
pub fn guess_type(s: &str) -> TypeHint {
    if s.is_empty() {
        return TypeHint::Unknown;
    }
    if NULLS.contains(&s) {
        return TypeHint::Null;
    }
    if TRUES.contains(&s) {
        return TypeHint::Bool;
    }
    if FALSES.contains(&s) {
        return TypeHint::Bool;
    }

    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    match rest {
        ".inf" | ".Inf" | ".INF" => return TypeHint::Inf { negative: sign },
        ".nan" | ".NaN" | ".NAN" => return TypeHint::NaN,
        _ => {}
    }

    if let Some(hint) = guess_number(sign, rest) {
        return hint;
    }

    TypeHint::Unknown
}

fn guess_number(sign: bool, rest: &str) -> Option<TypeHint> {
    if rest.is_empty() {
        return None;
    }

    let mut chars = rest.chars().peekable();
    let mut saw_digit = false;
    while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
        chars.next();
        saw_digit = true;
    }
    if !saw_digit {
        return None;
    }

    match chars.peek() {
        None => {
            // Pure integer; leading zero with more digits is still `int` in
            // the core schema (unlike JSON), octal/hex prefixes aside.
            let _ = sign;
            Some(TypeHint::Int)
        }
        Some('.') => {
            chars.next();
            let mut saw_frac_digit = false;
            while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
                chars.next();
                saw_frac_digit = true;
            }
            if !saw_frac_digit && chars.peek().is_none() {
                // "123." with no fractional digits and no exponent: still a
                // valid core-schema float.
                return Some(TypeHint::Float);
            }
            guess_exponent_tail(&mut chars).then_some(TypeHint::Float)
        }
        Some('e') | Some('E') => {
            guess_exponent_from_e(&mut chars).then_some(TypeHint::Float)
        }
        _ => None,
    }
}

fn guess_exponent_tail(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> bool {
    match chars.peek() {
        None => true,
        Some('e') | Some('E') => guess_exponent_from_e(chars),
        _ => false,
    }
}

fn guess_exponent_from_e(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> bool {
    // Consume 'e'/'E'.
    chars.next();
    if matches!(chars.peek(), Some('+') | Some('-')) {
        chars.next();
    }
    let mut saw_digit = false;
    while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
        chars.next();
        saw_digit = true;
    }
    saw_digit && chars.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_null_variants() {
        for s in ["~", "null", "Null", "NULL"] {
            assert_eq!(guess_type(s), TypeHint::Null, "{s}");
        }
    }

    #[test]
    fn recognizes_bool_variants() {
        for s in ["true", "False", "yes", "NO", "on", "OFF", "y", "N"] {
            assert_eq!(guess_type(s), TypeHint::Bool, "{s}");
        }
    }

    #[test]
    fn recognizes_integers() {
        assert_eq!(guess_type("42"), TypeHint::Int);
        assert_eq!(guess_type("-7"), TypeHint::Int);
        assert_eq!(guess_type("+3"), TypeHint::Int);
    }

    #[test]
    fn recognizes_floats() {
        assert_eq!(guess_type("3.14"), TypeHint::Float);
        assert_eq!(guess_type("-1.0e10"), TypeHint::Float);
        assert_eq!(guess_type("6.022E+23"), TypeHint::Float);
        assert_eq!(guess_type("1."), TypeHint::Float);
    }

    #[test]
    fn recognizes_inf_and_nan() {
        assert_eq!(guess_type(".inf"), TypeHint::Inf { negative: false });
        assert_eq!(guess_type("-.Inf"), TypeHint::Inf { negative: true });
        assert_eq!(guess_type(".NaN"), TypeHint::NaN);
    }

    #[test]
    fn unknown_for_arbitrary_text() {
        assert_eq!(guess_type("hello world"), TypeHint::Unknown);
        assert_eq!(guess_type("42abc"), TypeHint::Unknown);
        assert_eq!(guess_type(""), TypeHint::Unknown);
    }

    #[test]
    fn purity_depends_only_on_input() {
        let a = guess_type("3.14");
        let b = guess_type("3.14");
        assert_eq!(a, b);
    }
}
