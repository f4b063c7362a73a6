// SPDX-License-Identifier: Apache-2.0

//! Literals: the connectivity value programmed into a single memristor or
//! carried on a decision-diagram edge.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::xbar_error::XbarError;

pub const TRUE_ATOM: &str = "True";
pub const FALSE_ATOM: &str = "False";

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    pub atom: String,
    pub positive: bool,
}

/// Whether `atom` can appear as a grid token: made of alphanumerics and
/// `_[].$` only, and not one of the constant tokens `0` and `1`.
pub fn is_token_atom(atom: &str) -> bool {
    !atom.is_empty()
        && atom != "0"
        && atom != "1"
        && atom
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '[' | ']' | '.' | '$'))
}

impl Literal {
    /// The reserved atoms always take their canonical polarity, so
    /// `Literal::new("True", false)` is the "always conducting" constant.
    pub fn new(atom: &str, positive: bool) -> Self {
        let positive = match atom {
            TRUE_ATOM => true,
            FALSE_ATOM => false,
            _ => positive,
        };
        Self {
            atom: atom.to_string(),
            positive,
        }
    }

    /// The "always conducting" sentinel.
    pub fn on() -> Self {
        Self::new(TRUE_ATOM, true)
    }

    /// The "never conducting" sentinel.
    pub fn off() -> Self {
        Self::new(FALSE_ATOM, false)
    }

    pub fn from_bool(value: bool) -> Self {
        if value { Self::on() } else { Self::off() }
    }

    /// Whether the atom is one of the reserved connectivity constants. The
    /// polarity is irrelevant for constants.
    pub fn is_constant(&self) -> bool {
        self.atom == TRUE_ATOM || self.atom == FALSE_ATOM
    }

    pub fn is_on(&self) -> bool {
        *self == Self::on()
    }

    pub fn is_off(&self) -> bool {
        *self == Self::off()
    }

    #[must_use]
    pub fn negate(&self) -> Self {
        Self {
            atom: self.atom.clone(),
            positive: !self.positive,
        }
    }

    /// Resolves this literal to a connectivity constant under `instance`.
    pub fn resolve(&self, instance: &HashMap<String, bool>) -> Result<bool, XbarError> {
        if self.is_constant() {
            return Ok(self.atom == TRUE_ATOM);
        }
        match instance.get(&self.atom) {
            Some(value) => Ok(*value == self.positive),
            None => Err(XbarError::UnboundVariable(self.atom.clone())),
        }
    }

    /// Partial assignment: a literal over `atom` becomes the constant it takes
    /// when `atom` is `value`; any other literal is returned unchanged.
    #[must_use]
    pub fn fix(&self, atom: &str, value: bool) -> Self {
        if self.is_constant() || self.atom != atom {
            return self.clone();
        }
        Self::from_bool(self.positive == value)
    }

    /// Token used in the crossbar grid format: `0`, `1`, `atom` or `~atom`.
    pub fn to_token(&self) -> String {
        if self.atom == TRUE_ATOM {
            "1".to_string()
        } else if self.atom == FALSE_ATOM {
            "0".to_string()
        } else if self.positive {
            self.atom.clone()
        } else {
            format!("~{}", self.atom)
        }
    }

    pub fn from_token(token: &str) -> Result<Self, XbarError> {
        match token {
            "0" => Ok(Self::off()),
            "1" => Ok(Self::on()),
            _ => {
                let (atom, positive) = match token.strip_prefix('~') {
                    Some(rest) => (rest, false),
                    None => (token, true),
                };
                if !is_token_atom(atom) {
                    return Err(XbarError::MalformedRecord(format!(
                        "unknown literal token '{}'",
                        token
                    )));
                }
                Ok(Self::new(atom, positive))
            }
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;

    #[test]
    fn test_constants_ignore_polarity_when_resolving() {
        let instance = HashMap::new();
        assert_eq!(Literal::new(TRUE_ATOM, false).resolve(&instance).unwrap(), true);
        assert_eq!(Literal::new(FALSE_ATOM, true).resolve(&instance).unwrap(), false);
    }

    #[test]
    fn test_resolve_respects_polarity() {
        let instance = hashmap! { "a".to_string() => true };
        assert!(Literal::new("a", true).resolve(&instance).unwrap());
        assert!(!Literal::new("a", false).resolve(&instance).unwrap());
    }

    #[test]
    fn test_resolve_unbound_atom_is_an_error() {
        let err = Literal::new("b", true).resolve(&HashMap::new()).unwrap_err();
        assert_eq!(err, XbarError::UnboundVariable("b".to_string()));
    }

    #[test]
    fn test_token_round_trip() {
        for lit in [
            Literal::on(),
            Literal::off(),
            Literal::new("x0", true),
            Literal::new("sel[3]", false),
        ] {
            assert_eq!(Literal::from_token(&lit.to_token()).unwrap(), lit);
        }
    }

    #[test]
    fn test_reserved_atoms_take_canonical_polarity() {
        assert_eq!(Literal::new(TRUE_ATOM, false), Literal::on());
        assert_eq!(Literal::new(FALSE_ATOM, true), Literal::off());
        let token = Literal::new(TRUE_ATOM, false).to_token();
        assert_eq!(Literal::from_token(&token).unwrap(), Literal::new(TRUE_ATOM, false));
    }

    #[test]
    fn test_fix_resolves_only_the_given_atom() {
        assert_eq!(Literal::new("a", true).fix("a", true), Literal::on());
        assert_eq!(Literal::new("a", false).fix("a", true), Literal::off());
        assert_eq!(Literal::new("a", false).fix("a", false), Literal::on());
        assert_eq!(Literal::new("b", true).fix("a", true), Literal::new("b", true));
        assert_eq!(Literal::off().fix("False", true), Literal::off());
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        for bad in ["", "~", "~~a", "a b", "a,b", "!a"] {
            assert!(
                matches!(Literal::from_token(bad), Err(XbarError::MalformedRecord(_))),
                "token {:?} should be rejected",
                bad
            );
        }
    }
}
