//! Substitution rules for the known defects in the generated bundle.
//!
//! A [`Rule`] is a (pattern, replacement) pair applied globally to a text
//! buffer. Rules run in a fixed sequence; each rule's output feeds the next
//! rule's input. A rule with zero matches leaves the buffer unchanged.

use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("invalid rule pattern '{pattern}': {source}")]
    BadPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// How a rule locates the text to rewrite.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Exact substring match.
    Literal(String),
    /// Compiled regular expression with capture/anchor semantics.
    Regex(Regex),
}

/// A single find-and-replace rule.
///
/// Replacement is global: every non-overlapping match in the buffer is
/// rewritten, not just the first.
#[derive(Debug, Clone)]
#[must_use = "Rule does nothing until apply() is called"]
pub struct Rule {
    pattern: Pattern,
    replacement: String,
    /// Skip the rule entirely while this marker is present in the buffer.
    ensure_absent: Option<String>,
}

impl Rule {
    /// Create a rule that matches an exact substring.
    pub fn literal(find: impl Into<String>, replacement: impl Into<String>) -> Self {
        Rule {
            pattern: Pattern::Literal(find.into()),
            replacement: replacement.into(),
            ensure_absent: None,
        }
    }

    /// Create a rule from a regular expression pattern.
    pub fn pattern(pattern: &str, replacement: impl Into<String>) -> Result<Self, RuleError> {
        let regex = Regex::new(pattern).map_err(|source| RuleError::BadPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Rule {
            pattern: Pattern::Regex(regex),
            replacement: replacement.into(),
            ensure_absent: None,
        })
    }

    /// Guard the rule behind a marker check.
    ///
    /// Required for rewrites whose replacement still contains the search
    /// text; without the guard a second run would insert the new text
    /// again.
    pub fn ensure_absent(mut self, marker: impl Into<String>) -> Self {
        self.ensure_absent = Some(marker.into());
        self
    }

    /// Replace every non-overlapping match in `text`.
    pub fn apply(&self, text: &str) -> String {
        if self.is_guarded(text) {
            return text.to_string();
        }
        match &self.pattern {
            Pattern::Literal(find) => text.replace(find.as_str(), &self.replacement),
            Pattern::Regex(regex) => regex
                .replace_all(text, self.replacement.as_str())
                .into_owned(),
        }
    }

    /// Number of non-overlapping matches in `text`, honoring the guard.
    pub fn match_count(&self, text: &str) -> usize {
        if self.is_guarded(text) {
            return 0;
        }
        match &self.pattern {
            Pattern::Literal(find) => text.matches(find.as_str()).count(),
            Pattern::Regex(regex) => regex.find_iter(text).count(),
        }
    }

    fn is_guarded(&self, text: &str) -> bool {
        self.ensure_absent
            .as_deref()
            .is_some_and(|marker| text.contains(marker))
    }

    /// The pattern source, for reporting.
    pub fn pattern_str(&self) -> &str {
        match &self.pattern {
            Pattern::Literal(find) => find,
            Pattern::Regex(regex) => regex.as_str(),
        }
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }
}

/// Apply each rule in sequence; each rule's output feeds the next.
pub fn apply_rules(text: &str, rules: &[Rule]) -> String {
    rules
        .iter()
        .fold(text.to_string(), |buffer, rule| rule.apply(&buffer))
}

/// A named, ordered rule list plus the completion notice its fix script
/// historically printed.
#[derive(Debug, Clone)]
pub struct RuleSet {
    name: &'static str,
    notice: &'static str,
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The one-line success notice for this set.
    pub fn notice(&self) -> &'static str {
        self.notice
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn apply(&self, text: &str) -> String {
        apply_rules(text, &self.rules)
    }
}

/// The missing-comma fixes for the `getOptimizedImagePath` call sites and
/// for the function definition itself.
///
/// Each pattern no longer matches its own replacement output, so a second
/// pass over patched text is a no-op.
pub fn syntax_fixes() -> Result<RuleSet, RuleError> {
    Ok(RuleSet {
        name: "syntax",
        notice: "Fixed all syntax errors in app.js",
        rules: vec![
            Rule::pattern(
                r"getOptimizedImagePath\(p\.image '",
                "getOptimizedImagePath(p.image, '",
            )?,
            Rule::pattern(
                r"getOptimizedImagePath\(product\.image '",
                "getOptimizedImagePath(product.image, '",
            )?,
            Rule::pattern(
                r"function getOptimizedImagePath\(originalPath size",
                "function getOptimizedImagePath(originalPath, size",
            )?,
        ],
    })
}

/// The comma fixes in their whitespace-tolerant form, plus the rewrite that
/// makes optimized image paths keep the original file extension instead of
/// forcing `.jpg`.
pub fn image_path_fixes() -> Result<RuleSet, RuleError> {
    // Marker inserted by the last rule; its presence means the extension
    // capture is already in place.
    const EXT_CAPTURE: &str = "const ext = filename.match(/\\.[^/.]+$/)[0]";

    Ok(RuleSet {
        name: "image-paths",
        notice: "Fixed image paths to keep original extensions",
        rules: vec![
            Rule::pattern(
                r"getOptimizedImagePath\(p\.image\s+'thumbnail'",
                "getOptimizedImagePath(p.image, 'thumbnail'",
            )?,
            Rule::pattern(
                r"getOptimizedImagePath\(product\.image\s+'thumbnail'",
                "getOptimizedImagePath(product.image, 'thumbnail'",
            )?,
            Rule::pattern(
                r"getOptimizedImagePath\(originalPath\s+size",
                "getOptimizedImagePath(originalPath, size",
            )?,
            Rule::literal(
                "return `./assets/images/optimized/${nameWithoutExt}-${size}.jpg`",
                "return `./assets/images/optimized/${nameWithoutExt}-${size}${ext}`",
            ),
            Rule::literal(
                "const nameWithoutExt = filename.replace(/\\.[^/.]+$/, \"\")",
                "const ext = filename.match(/\\.[^/.]+$/)[0] // Get the extension (e.g., .png)\n    const nameWithoutExt = filename.replace(/\\.[^/.]+$/, \"\")",
            )
            .ensure_absent(EXT_CAPTURE),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_rule_replaces_all_occurrences() {
        let rule = Rule::literal("ab", "xy");
        assert_eq!(rule.apply("ab cd ab"), "xy cd xy");
        assert_eq!(rule.match_count("ab cd ab"), 2);
    }

    #[test]
    fn test_regex_rule_zero_matches_is_identity() {
        let rule = Rule::pattern(r"foo\d+", "bar").unwrap();
        assert_eq!(rule.apply("nothing here"), "nothing here");
        assert_eq!(rule.match_count("nothing here"), 0);
    }

    #[test]
    fn test_bad_pattern_is_reported() {
        let result = Rule::pattern(r"(unclosed", "x");
        assert!(matches!(result, Err(RuleError::BadPattern { .. })));
    }

    #[test]
    fn test_rules_apply_in_sequence() {
        // The first rule's output is the second rule's input.
        let rules = vec![Rule::literal("a", "b"), Rule::literal("b", "c")];
        assert_eq!(apply_rules("a", &rules), "c");
    }

    #[test]
    fn test_syntax_fixes_call_sites() {
        let fixes = syntax_fixes().unwrap();
        let broken = "getOptimizedImagePath(p.image 'thumbnail')";
        let patched = fixes.apply(broken);
        assert_eq!(patched, "getOptimizedImagePath(p.image, 'thumbnail')");

        let broken = "img.src = getOptimizedImagePath(product.image 'thumbnail')";
        let patched = fixes.apply(broken);
        assert_eq!(
            patched,
            "img.src = getOptimizedImagePath(product.image, 'thumbnail')"
        );
    }

    #[test]
    fn test_syntax_fixes_function_definition() {
        let fixes = syntax_fixes().unwrap();
        let broken = "function getOptimizedImagePath(originalPath size = 'thumbnail') {";
        let patched = fixes.apply(broken);
        assert_eq!(
            patched,
            "function getOptimizedImagePath(originalPath, size = 'thumbnail') {"
        );
    }

    #[test]
    fn test_syntax_fixes_leave_other_text_alone() {
        let fixes = syntax_fixes().unwrap();
        let input = "const cart = [];\nfunction renderProducts() {}\n";
        assert_eq!(fixes.apply(input), input);
    }

    #[test]
    fn test_syntax_fixes_are_idempotent() {
        let fixes = syntax_fixes().unwrap();
        let broken = "const x = getOptimizedImagePath(p.image 'thumb');\n";
        let once = fixes.apply(broken);
        let twice = fixes.apply(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_image_path_fixes_tolerate_extra_whitespace() {
        let fixes = image_path_fixes().unwrap();
        let broken = "getOptimizedImagePath(p.image   'thumbnail')";
        let patched = fixes.apply(broken);
        assert_eq!(patched, "getOptimizedImagePath(p.image, 'thumbnail')");
    }

    #[test]
    fn test_image_path_fixes_keep_extension() {
        let fixes = image_path_fixes().unwrap();
        let broken = "return `./assets/images/optimized/${nameWithoutExt}-${size}.jpg`";
        let patched = fixes.apply(broken);
        assert_eq!(
            patched,
            "return `./assets/images/optimized/${nameWithoutExt}-${size}${ext}`"
        );
    }

    #[test]
    fn test_guarded_rule_does_not_reinsert() {
        let fixes = image_path_fixes().unwrap();
        let broken = "const nameWithoutExt = filename.replace(/\\.[^/.]+$/, \"\")";
        let once = fixes.apply(broken);
        assert!(once.contains("const ext = filename.match"));

        let twice = fixes.apply(&once);
        assert_eq!(once, twice);
        assert_eq!(once.matches("const ext = filename.match").count(), 1);
    }
}
