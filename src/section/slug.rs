use std::collections::HashSet;

const EMPTY_SLUG: &str = "section";

/// Derives the id of a heading: lower-case, punctuation stripped, whitespace
/// runs collapsed to a single hyphen. Adjacent hyphens, literal or from
/// whitespace, collapse to one, so `A - B` and `A--B` both give `a-b`.
pub fn slugify(heading: &str) -> String {
    let mut slug = String::with_capacity(heading.len());
    let mut pending_hyphen = false;

    for ch in heading.chars() {
        if ch.is_whitespace() {
            pending_hyphen = !slug.is_empty();
            continue;
        }

        if ch.is_alphanumeric() || ch == '-' || ch == '_' {
            if pending_hyphen {
                push_hyphen(&mut slug);
                pending_hyphen = false;
            }
            if ch == '-' {
                push_hyphen(&mut slug);
            } else {
                slug.extend(ch.to_lowercase());
            }
        }
    }

    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug
    }
}

fn push_hyphen(slug: &mut String) {
    if !slug.ends_with('-') {
        slug.push('-');
    }
}

/// Hands out sibling-unique ids, suffixing collisions with `-2`, `-3`, ...
#[derive(Debug, Default)]
pub struct SiblingIds {
    used: HashSet<String>,
}

impl SiblingIds {
    pub fn reserve(&mut self, id: &str) {
        self.used.insert(id.to_string());
    }

    pub fn assign(&mut self, base: &str) -> String {
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }

        let mut suffix = 2usize;
        loop {
            let candidate = format!("{base}-{suffix}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }
}
