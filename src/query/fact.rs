//! Ground facts: the atomic truth units of a trace position.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque attribute value carried by a [`GroundFact`].
///
/// Kept intentionally small and structural: the evaluator and SMT encoder
/// never interpret these values, only compare them for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    /// Fixed-point representation of a probability/confidence, e.g. `0.87`
    /// encoded as `87` at scale `100`. Kept as an integer so `GroundFact`
    /// can derive `Eq`/`Hash`; the scale is a convention of the caller.
    Fixed(i64),
    Location(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => write!(f, "{s}"),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Fixed(v) => write!(f, "{v}"),
            AttrValue::Location(l) => write!(f, "{l}"),
        }
    }
}

/// A named predicate with an ordered tuple of attribute values.
///
/// Equality is structural: `Gesture("curl", 87, Wrist) == Gesture("curl",
/// 87, Wrist)` regardless of identity. Used both as the trace-level truth
/// unit and as the key for the SMT backend's uninterpreted-predicate
/// encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroundFact {
    pub name: String,
    pub args: Vec<AttrValue>,
}

impl GroundFact {
    pub fn new(name: impl Into<String>, args: Vec<AttrValue>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Convenience constructor for the common case of an all-string tuple.
    pub fn of(name: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new(
            name,
            args.into_iter().map(|a| AttrValue::Str(a.into())).collect(),
        )
    }

    /// Stable key used by the SMT encoder to name the uninterpreted
    /// predicate for this fact: `name(arg0,arg1,...)`.
    pub fn predicate_key(&self) -> String {
        let mut key = self.name.clone();
        key.push('(');
        for (i, a) in self.args.iter().enumerate() {
            if i > 0 {
                key.push(',');
            }
            key.push_str(&a.to_string());
        }
        key.push(')');
        key
    }
}

impl fmt::Display for GroundFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.predicate_key())
    }
}

/// A literal: a ground fact or its negation. Facts never nest negation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Fact {
    Pos(GroundFact),
    Neg(GroundFact),
}

impl Fact {
    pub fn ground(&self) -> &GroundFact {
        match self {
            Fact::Pos(g) | Fact::Neg(g) => g,
        }
    }

    pub fn negate(&self) -> Fact {
        match self {
            Fact::Pos(g) => Fact::Neg(g.clone()),
            Fact::Neg(g) => Fact::Pos(g.clone()),
        }
    }

    /// Evaluate this literal against a set of ground facts known to hold.
    pub fn holds(&self, facts: &std::collections::HashSet<GroundFact>) -> bool {
        match self {
            Fact::Pos(g) => facts.contains(g),
            Fact::Neg(g) => !facts.contains(g),
        }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fact::Pos(g) => write!(f, "{g}"),
            Fact::Neg(g) => write!(f, "!{g}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ground_fact_equality_is_structural() {
        let a = GroundFact::of("Gesture", ["curl", "87", "Wrist"]);
        let b = GroundFact::of("Gesture", ["curl", "87", "Wrist"]);
        assert_eq!(a, b);
    }

    #[test]
    fn negate_round_trips() {
        let g = GroundFact::of("Gesture", ["curl"]);
        let f = Fact::Pos(g.clone());
        assert_eq!(f.negate().negate(), f);
        assert_eq!(f.negate(), Fact::Neg(g));
    }

    #[test]
    fn holds_respects_negation() {
        let g = GroundFact::of("Gesture", ["curl"]);
        let mut facts = std::collections::HashSet::new();
        facts.insert(g.clone());
        assert!(Fact::Pos(g.clone()).holds(&facts));
        assert!(!Fact::Neg(g).holds(&facts));
    }
}
