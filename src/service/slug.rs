/// Lowercase ASCII slug: alphanumerics kept, every other run collapsed to `-`.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Explicit slug when given (normalized), otherwise derived from the title.
pub fn slug_or_title(slug: Option<&str>, title: &str) -> String {
    match slug.map(slugify).filter(|s| !s.is_empty()) {
        Some(s) => s,
        None => slugify(title),
    }
}

pub const WORDS_PER_MINUTE: usize = 200;

pub fn reading_minutes(content: &str) -> i64 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_collapse_separators() {
        assert_eq!(slugify("  Zero-Trust: What's Next?  "), "zero-trust-what-s-next");
        assert_eq!(slugify("SOC 2 -- Type II"), "soc-2-type-ii");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn falls_back_to_title() {
        assert_eq!(slug_or_title(None, "Incident Response 101"), "incident-response-101");
        assert_eq!(slug_or_title(Some("  "), "Red Team"), "red-team");
        assert_eq!(slug_or_title(Some("Custom Slug"), "ignored"), "custom-slug");
    }

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(reading_minutes(""), 1);
        assert_eq!(reading_minutes(&"word ".repeat(200)), 1);
        assert_eq!(reading_minutes(&"word ".repeat(201)), 2);
    }
}
