//! Attribute codec.
//!
//! Rule-induction output strips whitespace from names and values, so both
//! are swapped for short tokens before fitting and restored afterwards. Every
//! token comes from one counter owned by [`Codec`]: attribute `i` becomes
//! `X<i>X`, and a binary domain encoded at index `j` becomes `X<j>X` /
//! `Y<j>Y`. The trailing marker keeps `X1X` from being a prefix of `X16X`.

use std::collections::HashMap;

use crate::conditioner::ClassDomain;

/// Ordered `(key, replacement)` pairs applied as one left-to-right scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeTable {
    entries: Vec<(String, String)>,
}

impl DecodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Empty keys are ignored.
    pub fn insert(&mut self, key: impl Into<String>, replacement: impl Into<String>) {
        let key = key.into();
        if !key.is_empty() {
            self.entries.push((key, replacement.into()));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replace every key occurrence in `text`. At each position the longest
    /// matching key wins (earlier entries win ties); replacement text is never
    /// rescanned.
    pub fn apply(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + text.len() / 2);
        let mut rest = text;
        while !rest.is_empty() {
            let mut best: Option<&(String, String)> = None;
            for entry in &self.entries {
                if rest.starts_with(entry.0.as_str())
                    && best.is_none_or(|b| entry.0.len() > b.0.len())
                {
                    best = Some(entry);
                }
            }
            match best {
                Some((key, replacement)) => {
                    out.push_str(replacement);
                    rest = &rest[key.len()..];
                }
                None => {
                    let mut chars = rest.chars();
                    if let Some(ch) = chars.next() {
                        out.push(ch);
                    }
                    rest = chars.as_str();
                }
            }
        }
        out
    }
}

/// Tree-internal binary code (0 / 1) to original domain value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryDomain([String; 2]);

impl BinaryDomain {
    pub fn new(zero: impl Into<String>, one: impl Into<String>) -> Self {
        Self([zero.into(), one.into()])
    }

    /// From the distinct values of a column; `None` unless there are exactly two.
    pub fn from_values(values: &[String]) -> Option<Self> {
        match values {
            [zero, one] => Some(Self::new(zero.clone(), one.clone())),
            _ => None,
        }
    }

    pub fn value(&self, code: usize) -> &str {
        &self.0[code.min(1)]
    }

    /// 1 for the second value, 0 for anything else (missing included).
    pub fn code_of(&self, value: Option<&str>) -> u8 {
        u8::from(value == Some(self.0[1].as_str()))
    }
}

/// Per-attribute binary domains, keyed by attribute name.
pub type DomainDecode = HashMap<String, BinaryDomain>;

/// Token pair assigned to one binary categorical attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainTokens {
    pub domain: BinaryDomain,
    pub zero: String,
    pub one: String,
}

/// Owns the token counter and every mapping it has handed out.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    next_index: usize,
    attributes: Vec<(String, String)>,
    domains: Vec<(String, DomainTokens)>,
}

impl Codec {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_index(&mut self) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    /// Assign `X<i>X` to each name, in order. Returns the tokens.
    pub fn encode_attributes<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        names
            .iter()
            .map(|name| {
                let token = format!("X{}X", self.next_index());
                self.attributes
                    .push((name.as_ref().to_string(), token.clone()));
                token
            })
            .collect()
    }

    /// Assign a token pair to the two values of `attribute`.
    pub fn encode_domain(&mut self, attribute: &str, domain: BinaryDomain) -> &DomainTokens {
        let index = self.next_index();
        let tokens = DomainTokens {
            domain,
            zero: format!("X{index}X"),
            one: format!("Y{index}Y"),
        };
        self.domains.push((attribute.to_string(), tokens));
        let (_, tokens) = &self.domains[self.domains.len() - 1];
        tokens
    }

    pub fn encode(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t.as_str())
    }

    pub fn decode(&self, token: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(_, t)| t == token)
            .map(|(n, _)| n.as_str())
    }

    pub fn domain_tokens(&self, attribute: &str) -> Option<&DomainTokens> {
        self.domains
            .iter()
            .find(|(a, _)| a == attribute)
            .map(|(_, t)| t)
    }

    /// Token for a cell of an encoded attribute: the second value maps to the
    /// `Y` token, everything else (missing included) to the `X` token.
    pub fn encode_value(&self, attribute: &str, value: Option<&str>) -> Option<&str> {
        self.domain_tokens(attribute).map(|t| {
            if t.domain.code_of(value) == 1 {
                t.one.as_str()
            } else {
                t.zero.as_str()
            }
        })
    }

    /// Attribute tokens followed by the rule-list structural rewrites and the
    /// canonical guards. The disjunction marker closes a rule on the positive
    /// class.
    pub fn attribute_decode(&self, class_domain: &ClassDomain) -> DecodeTable {
        let mut table = DecodeTable::new();
        for (name, token) in &self.attributes {
            table.insert(token.clone(), name.clone());
        }
        table.insert(" ^ ", ") AND (");
        table.insert("=", " = ");
        table.insert(" V", format!(" => {}", class_domain.positive()));
        table.insert("[[", "(");
        table.insert("]]", ")");
        table.insert("[", "(");
        table.insert("]", ")");
        for guard in [" = ", " => ", "<=", ">="] {
            table.insert(guard, guard);
        }
        table
    }

    /// Domain tokens back to their values.
    pub fn domain_decode(&self) -> DecodeTable {
        let mut table = DecodeTable::new();
        for (_, tokens) in &self.domains {
            table.insert(tokens.zero.clone(), tokens.domain.value(0));
            table.insert(tokens.one.clone(), tokens.domain.value(1));
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("attr_{i}")).collect()
    }

    #[test]
    fn test_round_trip_for_every_attribute() {
        let mut codec = Codec::new();
        let attrs = names(20);
        let tokens = codec.encode_attributes(&attrs);
        assert_eq!(tokens[1], "X1X");
        assert_eq!(tokens[16], "X16X");
        for name in &attrs {
            let token = codec.encode(name).unwrap();
            assert_eq!(codec.decode(token), Some(name.as_str()));
        }
    }

    #[test]
    fn test_tokens_never_cross_decode() {
        let mut codec = Codec::new();
        codec.encode_attributes(&names(17));
        let table = codec.attribute_decode(&ClassDomain::new("n", "p"));
        assert_eq!(table.apply("X1X"), "attr_1");
        assert_eq!(table.apply("X10X"), "attr_10");
        assert_eq!(table.apply("X16X"), "attr_16");
        assert_eq!(table.apply("X16X ^ X1X"), "attr_16) AND (attr_1");
    }

    #[test]
    fn test_domain_tokens_continue_the_counter() {
        let mut codec = Codec::new();
        codec.encode_attributes(&["color", "size", "class"]);
        let tokens = codec.encode_domain("color", BinaryDomain::new("red", "blue"));
        assert_eq!(tokens.zero, "X3X");
        assert_eq!(tokens.one, "Y3Y");
        let tokens = codec.encode_domain("size", BinaryDomain::new("S", "L"));
        assert_eq!(tokens.zero, "X4X");

        assert_eq!(codec.encode_value("color", Some("blue")), Some("Y3Y"));
        assert_eq!(codec.encode_value("color", Some("red")), Some("X3X"));
        assert_eq!(codec.encode_value("color", None), Some("X3X"));
        assert_eq!(codec.encode_value("class", Some("x")), None);

        let domain = codec.domain_decode();
        assert_eq!(domain.get("Y3Y"), Some("blue"));
        assert_eq!(domain.get("X4X"), Some("S"));
        assert!(codec.attribute_decode(&ClassDomain::new("n", "p")).get("X3X").is_none());
    }

    #[test]
    fn test_apply_prefers_longest_key() {
        let mut table = DecodeTable::new();
        table.insert("[", "(");
        table.insert("[[", "((");
        table.insert("", "ignored");
        assert_eq!(table.len(), 2);
        assert_eq!(table.apply("[[a]"), "((a]");
    }

    #[test]
    fn test_apply_does_not_rescan_replacements() {
        let mut table = DecodeTable::new();
        table.insert("a", "b");
        table.insert("b", "c");
        assert_eq!(table.apply("ab"), "bc");
    }

    #[test]
    fn test_structural_rewrite_of_a_native_line() {
        let mut codec = Codec::new();
        codec.encode_attributes(&["outlook", "humidity"]);
        let table = codec.attribute_decode(&ClassDomain::new("stay", "play"));
        assert_eq!(
            table.apply("[[X0X=sunny ^ X1X=<=70] V"),
            "(outlook = sunny) AND (humidity = <=70) => play"
        );
        assert_eq!(table.apply("[X1X=high]]"), "(humidity = high)");
    }

    #[test]
    fn test_binary_domain_codes() {
        let domain = BinaryDomain::from_values(&["no".into(), "yes".into()]).unwrap();
        assert_eq!(domain.code_of(Some("yes")), 1);
        assert_eq!(domain.code_of(Some("no")), 0);
        assert_eq!(domain.code_of(None), 0);
        assert_eq!(domain.value(1), "yes");
        assert!(BinaryDomain::from_values(&["a".into()]).is_none());
    }
}
