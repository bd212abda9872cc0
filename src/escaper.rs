use crate::entities::{EntityCatalog, EscapeMode, escaped_entity_pattern, get_entity_map};
use serde::Serialize;

/// The outcome of escaping one piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EscapeResult {
    /// The escaped content.
    pub content: String,
    /// Number of characters that were replaced by an entity.
    pub escaped_count: usize,
    /// `true` if `escaped_count > 0`.
    pub has_changes: bool,
}

/// Escapes HTML-sensitive characters in `content` without touching
/// entity references that are already present.
///
/// The text is split at every match of the already-escaped pattern. Matched
/// spans are copied through verbatim; every other character is looked up in
/// the catalog for `mode` and replaced by its entity when present. Inserted
/// entities are written straight to the output and never rescanned, so a
/// fresh `&amp;` cannot be escaped a second time.
pub fn escape(content: &str, mode: EscapeMode) -> EscapeResult {
    let catalog = get_entity_map(mode);
    let mut escaped = String::with_capacity(content.len());
    let mut escaped_count = 0;
    let mut cursor = 0;

    for protected in escaped_entity_pattern().find_iter(content) {
        escaped_count += escape_segment(&content[cursor..protected.start()], catalog, &mut escaped);
        escaped.push_str(protected.as_str());
        cursor = protected.end();
    }
    escaped_count += escape_segment(&content[cursor..], catalog, &mut escaped);

    EscapeResult {
        content: escaped,
        escaped_count,
        has_changes: escaped_count > 0,
    }
}

/// Appends `segment` to `out` with catalog characters replaced.
/// Returns the number of replacements.
fn escape_segment(segment: &str, catalog: &EntityCatalog, out: &mut String) -> usize {
    let mut count = 0;
    let mut run_start = 0;

    for (idx, ch) in segment.char_indices() {
        if let Some(entity) = catalog.get(ch) {
            out.push_str(&segment[run_start..idx]);
            out.push_str(entity);
            run_start = idx + ch.len_utf8();
            count += 1;
        }
    }
    out.push_str(&segment[run_start..]);

    count
}

/// Returns `true` if escaping `content` would change it.
pub fn has_unescaped_entities(content: &str, mode: EscapeMode) -> bool {
    escape(content, mode).has_changes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(input: &str, mode: EscapeMode, expected: &str, count: usize) {
        let result = escape(input, mode);
        assert_eq!(result.content, expected, "input: {input:?}");
        assert_eq!(result.escaped_count, count, "input: {input:?}");
        assert_eq!(result.has_changes, count > 0, "input: {input:?}");
    }

    #[test]
    fn test_essential_basic() {
        let cases = [
            ("Hello World", "Hello World", 0),
            ("Test's quote", "Test&#39;s quote", 1),
            ("Say \"hello\"", "Say &quot;hello&quot;", 2),
            ("<script>", "&lt;script&gt;", 2),
            ("Tom & Jerry", "Tom &amp; Jerry", 1),
        ];
        for (input, expected, count) in cases {
            check(input, EscapeMode::Essential, expected, count);
        }
    }

    #[test]
    fn test_essential_combined() {
        check(
            r#"It's a "test" with <tags> & symbols"#,
            EscapeMode::Essential,
            "It&#39;s a &quot;test&quot; with &lt;tags&gt; &amp; symbols",
            6,
        );
    }

    #[test]
    fn test_already_escaped_is_untouched() {
        for input in ["&amp;", "&lt;div&gt;", "&#39;quoted&#39;", "&quot;test&quot;", "&#x27;"] {
            check(input, EscapeMode::Essential, input, 0);
        }
    }

    #[test]
    fn test_bare_ampersand_next_to_entity() {
        check(
            "Already &amp; but also &",
            EscapeMode::Essential,
            "Already &amp; but also &amp;",
            1,
        );
        check("&&amp;", EscapeMode::Essential, "&amp;&amp;", 1);
        check("&amp&", EscapeMode::Essential, "&amp;amp&amp;", 2);
    }

    #[test]
    fn test_unknown_named_reference_is_preserved() {
        check("a &bogus; b", EscapeMode::Essential, "a &bogus; b", 0);
    }

    #[test]
    fn test_empty_and_plain_input() {
        check("", EscapeMode::Essential, "", 0);
        check("", EscapeMode::Extended, "", 0);
        check("Numbers 12345", EscapeMode::Extended, "Numbers 12345", 0);
    }

    #[test]
    fn test_extended_symbols() {
        let cases = [
            ("© 2024", "&copy; 2024", 1),
            ("Trademark™", "Trademark&trade;", 1),
            ("Registered®", "Registered&reg;", 1),
            ("Em—dash", "Em&mdash;dash", 1),
            ("En–dash", "En&ndash;dash", 1),
            ("a\u{00A0}b", "a&nbsp;b", 1),
            ("1 → 2 ≤ 3", "1 &rarr; 2 &le; 3", 2),
        ];
        for (input, expected, count) in cases {
            check(input, EscapeMode::Extended, expected, count);
        }
    }

    #[test]
    fn test_essential_mode_ignores_extended_symbols() {
        check("© 2024 & co", EscapeMode::Essential, "© 2024 &amp; co", 1);
    }

    #[test]
    fn test_private_use_characters_pass_through() {
        let input = "\u{E000}PH_0\u{E001} & &amp;";
        check(
            input,
            EscapeMode::Essential,
            "\u{E000}PH_0\u{E001} &amp; &amp;",
            1,
        );
    }

    #[test]
    fn test_idempotence() {
        let samples = [
            "",
            "Tom & Jerry",
            "<a href=\"x?y=1&z=2\">it's</a>",
            "© 2024 — 50% × 2 ≠ ∞ &copy; &#169; &#xA9;",
            "&&&;;;<<>>",
            "&#;&#x;&;",
        ];
        for mode in [EscapeMode::Essential, EscapeMode::Extended] {
            for sample in samples {
                let once = escape(sample, mode);
                let twice = escape(&once.content, mode);
                assert_eq!(twice.escaped_count, 0, "{sample:?} in {mode}");
                assert_eq!(twice.content, once.content);
            }
        }
    }

    #[test]
    fn test_count_matches_unprotected_catalog_characters() {
        let input = "x < y && &lt; z > \"q\" &#60; '";
        let catalog = get_entity_map(EscapeMode::Essential);
        let protected: String = escaped_entity_pattern().replace_all(input, "").into_owned();
        let expected = protected.chars().filter(|c| catalog.contains(*c)).count();

        assert_eq!(escape(input, EscapeMode::Essential).escaped_count, expected);
    }

    #[test]
    fn test_has_unescaped_entities_agrees_with_escape() {
        for input in ["plain", "&amp;", "a & b", "©"] {
            for mode in [EscapeMode::Essential, EscapeMode::Extended] {
                assert_eq!(
                    has_unescaped_entities(input, mode),
                    escape(input, mode).has_changes
                );
            }
        }
        assert!(!has_unescaped_entities("©", EscapeMode::Essential));
        assert!(has_unescaped_entities("©", EscapeMode::Extended));
    }
}
