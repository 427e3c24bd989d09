//! Enumerated column literals and category coercion.

use crate::error::SchemaError;

/// Closed set of inventory classes a request may name. Each group lists its accepted
/// synonyms and the prefix its stored literal is expected to start with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CategoryGroup {
    Raw,
    Finished,
}

impl CategoryGroup {
    pub const ALL: [CategoryGroup; 2] = [CategoryGroup::Raw, CategoryGroup::Finished];

    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            CategoryGroup::Raw => &["raw", "rawmaterial", "rawmaterials"],
            CategoryGroup::Finished => &["finished", "finishedproduct", "finishedgoods"],
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            CategoryGroup::Raw => "raw",
            CategoryGroup::Finished => "finished",
        }
    }

    /// Literal written when the column is not enumerated.
    pub fn canonical(self) -> &'static str {
        match self {
            CategoryGroup::Raw => "RawMaterials",
            CategoryGroup::Finished => "FinishedGoods",
        }
    }

    pub fn from_synonym(requested: &str) -> Option<Self> {
        let r = requested.trim().to_lowercase();
        Self::ALL.into_iter().find(|g| g.synonyms().contains(&r.as_str()))
    }

    /// Group a stored literal belongs to, by prefix.
    pub fn of_literal(stored: &str) -> Option<Self> {
        let s = stored.trim().to_lowercase();
        Self::ALL.into_iter().find(|g| s.starts_with(g.prefix()))
    }
}

/// Parse the quoted literals out of an `enum('a','b')` descriptor, in declaration order.
/// Commas inside quotes belong to the literal; `''` is an escaped quote.
/// Returns `None` when the descriptor is not an enumeration.
pub fn parse_enum_descriptor(descriptor: &str) -> Option<Vec<String>> {
    let s = descriptor.trim();
    let head = s.get(..5)?;
    if !head.eq_ignore_ascii_case("enum(") || !s.ends_with(')') {
        return None;
    }
    let inside = &s[5..s.len() - 1];

    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut chars = inside.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quote {
            if ch == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    current.push('\'');
                } else {
                    in_quote = false;
                    values.push(std::mem::take(&mut current));
                }
            } else {
                current.push(ch);
            }
        } else if ch == '\'' {
            in_quote = true;
        }
    }
    Some(values.into_iter().filter(|v| !v.is_empty()).collect())
}

/// Map a requested category onto one of the stored literals.
///
/// Exact (case-insensitive) match first, then a synonym group's prefix; anything else
/// is rejected with the full allowed set.
pub fn coerce_category(requested: &str, allowed: &[String]) -> Result<String, SchemaError> {
    let r = requested.trim().to_lowercase();
    let rejected = || SchemaError::CategoryRejected {
        requested: requested.to_string(),
        allowed: allowed.to_vec(),
    };
    if r.is_empty() {
        return Err(rejected());
    }

    if let Some(exact) = allowed.iter().find(|a| a.to_lowercase() == r) {
        return Ok(exact.clone());
    }

    if let Some(group) = CategoryGroup::from_synonym(&r) {
        if let Some(hit) = allowed.iter().find(|a| a.to_lowercase().starts_with(group.prefix())) {
            return Ok(hit.clone());
        }
    }

    Err(rejected())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_literals_in_declaration_order() {
        assert_eq!(
            parse_enum_descriptor("enum('RawMaterial','FinishedProduct')"),
            Some(allowed(&["RawMaterial", "FinishedProduct"]))
        );
        assert_eq!(
            parse_enum_descriptor("ENUM('b', 'a')"),
            Some(allowed(&["b", "a"]))
        );
    }

    #[test]
    fn commas_and_quotes_inside_literals_survive() {
        assert_eq!(
            parse_enum_descriptor("enum('a,b','it''s','c')"),
            Some(allowed(&["a,b", "it's", "c"]))
        );
    }

    #[test]
    fn non_enum_descriptors_yield_none() {
        assert_eq!(parse_enum_descriptor("character varying"), None);
        assert_eq!(parse_enum_descriptor("int"), None);
        assert_eq!(parse_enum_descriptor("enum('a'"), None);
    }

    #[test]
    fn raw_synonym_maps_to_stored_literal() {
        let a = allowed(&["RawMaterial", "FinishedProduct"]);
        assert_eq!(coerce_category("raw", &a).unwrap(), "RawMaterial");
        assert_eq!(coerce_category("RawMaterials", &a).unwrap(), "RawMaterial");
        assert_eq!(coerce_category("FinishedGoods", &a).unwrap(), "FinishedProduct");
    }

    #[test]
    fn exact_match_keeps_stored_casing() {
        let a = allowed(&["RawMaterials", "FinishedGoods"]);
        assert_eq!(coerce_category("finishedgoods", &a).unwrap(), "FinishedGoods");
    }

    #[test]
    fn unknown_category_is_rejected_with_allowed_set() {
        let a = allowed(&["RawMaterial", "FinishedProduct"]);
        assert_eq!(
            coerce_category("Widget", &a),
            Err(SchemaError::CategoryRejected {
                requested: "Widget".into(),
                allowed: a.clone(),
            })
        );
        assert!(coerce_category("  ", &a).is_err());
    }

    #[test]
    fn synonym_without_matching_prefix_is_rejected() {
        let a = allowed(&["Ingredient", "Product"]);
        assert!(coerce_category("raw", &a).is_err());
    }

    #[test]
    fn groups_classify_literals_by_prefix() {
        assert_eq!(CategoryGroup::of_literal("RawMaterial"), Some(CategoryGroup::Raw));
        assert_eq!(CategoryGroup::of_literal("FinishedGoods"), Some(CategoryGroup::Finished));
        assert_eq!(CategoryGroup::of_literal("Other"), None);
        assert_eq!(CategoryGroup::from_synonym(" FinishedProduct "), Some(CategoryGroup::Finished));
    }
}
