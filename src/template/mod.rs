//! `{{placeholder}}` expansion for command argument and prompt templates.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Keys may contain dots and hyphens, e.g. {{transcript.path}} or {{base-name}}.
    RE.get_or_init(|| Regex::new(r"\{\{\s*([\w.\-]+)\s*\}\}").expect("valid placeholder regex"))
}

/// Replace every `{{ key }}` occurrence with the mapped value.
///
/// Whitespace around the key name is ignored. A key absent from the map
/// expands to the empty string. Text outside placeholders is left untouched.
pub fn expand(template: &str, values: &HashMap<String, String>) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            values.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

/// Convenience for building the replacement map from `(key, value)` pairs.
pub fn values<const N: usize>(pairs: [(&str, String); N]) -> HashMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_expand_replaces_present_keys() {
        let result = expand(
            "--input {{audioFile}} --out {{outputDir}}",
            &map(&[("audioFile", "/tmp/a.wav"), ("outputDir", "/tmp/out")]),
        );
        assert_eq!(result, "--input /tmp/a.wav --out /tmp/out");
    }

    #[test]
    fn test_expand_ignores_whitespace_around_key() {
        let result = expand("{{  baseName  }}.txt", &map(&[("baseName", "meeting")]));
        assert_eq!(result, "meeting.txt");
    }

    #[test]
    fn test_expand_absent_key_becomes_empty() {
        let result = expand("model={{model}}!", &map(&[]));
        assert_eq!(result, "model=!");
    }

    #[test]
    fn test_expand_keys_with_dots_and_hyphens() {
        let result = expand(
            "{{a.b}} {{c-d}}",
            &map(&[("a.b", "one"), ("c-d", "two")]),
        );
        assert_eq!(result, "one two");
    }

    #[test]
    fn test_expand_leaves_other_text_unchanged() {
        let result = expand("no placeholders { here }", &map(&[("here", "x")]));
        assert_eq!(result, "no placeholders { here }");
    }

    #[test]
    fn test_expand_is_idempotent_without_placeholders() {
        let values = map(&[("transcript", "hello")]);
        let once = expand("say {{transcript}}", &values);
        assert_eq!(expand(&once, &values), once);
    }
}
