//! Property-based tests for HTML escaping and highlighting
//!
//! Tests invariants:
//! - Escaped output never contains raw markup characters
//! - Highlighting is transparent once the `<mark>` tags are removed

use proptest::prelude::*;

use crate::core::render::{escape_html, highlight};

proptest! {
    #[test]
    fn escaped_text_has_no_markup(text in any::<String>()) {
        let escaped = escape_html(&text);
        prop_assert!(!escaped.contains('<'));
        prop_assert!(!escaped.contains('>'));
        prop_assert!(!escaped.contains('"'));
        prop_assert!(!escaped.contains('\''));
    }

    #[test]
    fn highlight_only_adds_marks(
        text in "[a-zA-Z<>&\"' ]{0,40}",
        query in "[a-zA-Z<>&;# ]{0,4}",
    ) {
        let escaped = escape_html(&text);
        let marked = highlight(&escaped, &query);
        let stripped = marked.replace("<mark>", "").replace("</mark>", "");
        prop_assert_eq!(stripped, escaped);
    }

    #[test]
    fn highlight_never_splits_entities(
        text in "[a-z<>& ]{0,30}",
        query in "[a-z;]{1,3}",
    ) {
        let marked = highlight(&escape_html(&text), &query);
        // A mark tag never lands between '&' and the entity's ';'.
        let mut in_entity = false;
        let mut rest = marked.as_str();
        while let Some(c) = rest.chars().next() {
            if rest.starts_with("<mark>") || rest.starts_with("</mark>") {
                prop_assert!(!in_entity, "mark inside entity: {}", marked);
                let skip = if rest.starts_with("<mark>") { 6 } else { 7 };
                rest = &rest[skip..];
                continue;
            }
            match c {
                '&' => in_entity = true,
                ';' => in_entity = false,
                _ => {}
            }
            rest = &rest[c.len_utf8()..];
        }
    }
}
