//! URL slug generation.

use unicode_normalization::UnicodeNormalization;

/// Lowercase the name and replace each space with a hyphen.
///
/// Used for products and services, whose slugs keep every other character.
///
/// ```
/// assert_eq!(dental_com_core::simple_slug("Night Guard XL"), "night-guard-xl");
/// ```
#[must_use]
pub fn simple_slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Strict slug for blog posts, categories and tags.
///
/// Accented letters are transliterated through NFKD decomposition and any
/// other non-ASCII character is dropped. ASCII alphanumerics and underscores
/// are kept, punctuation is removed, and runs of whitespace or hyphens
/// collapse into one `-`. Leading and trailing `-` and `_` are trimmed.
///
/// ```
/// assert_eq!(dental_com_core::slugify("Café Smile"), "cafe-smile");
/// ```
#[must_use]
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut in_separator = false;

    for c in value.nfkd().filter(char::is_ascii) {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() || c == '_' {
            slug.push(c);
            in_separator = false;
        } else if (c.is_ascii_whitespace() || c == '-') && !in_separator {
            slug.push('-');
            in_separator = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_slug_keeps_punctuation() {
        assert_eq!(simple_slug("Whitening Kit (Pro)"), "whitening-kit-(pro)");
        assert_eq!(simple_slug("Two  Spaces"), "two--spaces");
    }

    #[test]
    fn test_slugify_collapses_and_strips() {
        assert_eq!(slugify("  Hello, World!  "), "hello-world");
        assert_eq!(slugify("Floss -- Daily"), "floss-daily");
        assert_eq!(slugify("Top 10 Tips: Brushing"), "top-10-tips-brushing");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
    }

    #[test]
    fn test_slugify_transliterates_accents() {
        assert_eq!(slugify("Café Smile"), "cafe-smile");
        assert_eq!(slugify("Crème Brûlée Ñandú"), "creme-brulee-nandu");
        assert_eq!(slugify("ﬁrst visit"), "first-visit");
        assert_eq!(slugify("歯 care"), "care");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugify_trims_underscores_and_hyphens() {
        assert_eq!(slugify("__Braces__"), "braces");
        assert_eq!(slugify("-_ gum care _-"), "gum-care");
        assert_eq!(slugify("a - ! - b"), "a-b");
    }
}
