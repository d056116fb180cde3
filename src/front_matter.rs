//! Leading YAML front matter block (`---` ... `---`).

const OPEN_DELIMITER: &str = "---";
const CLOSE_DELIMITERS: [&str; 2] = ["---", "..."];

/// Splits `text` into `(front_matter, body)`. The front matter slice includes
/// both delimiter lines and the closing line terminator. Without a closed
/// block the whole text is body.
pub fn split_front_matter(text: &str) -> (&str, &str) {
    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return ("", text);
    };
    if first.trim_end() != OPEN_DELIMITER {
        return ("", text);
    }

    let mut offset = first.len();
    for line in lines {
        offset += line.len();
        if CLOSE_DELIMITERS.contains(&line.trim_end()) {
            return text.split_at(offset);
        }
    }

    ("", text)
}

/// Inner lines of a front matter slice, delimiters excluded.
pub fn inner_lines(front_matter: &str) -> Vec<&str> {
    let lines = front_matter.split_inclusive('\n').collect::<Vec<&str>>();
    if lines.len() < 2 {
        return Vec::new();
    }
    lines[1..lines.len() - 1].to_vec()
}

/// Assembles a new front matter block around `inner`.
pub fn wrap(inner: &str) -> String {
    let mut block = String::with_capacity(inner.len() + 8);
    block.push_str(OPEN_DELIMITER);
    block.push('\n');
    block.push_str(inner);
    if !inner.is_empty() && !inner.ends_with('\n') {
        block.push('\n');
    }
    block.push_str(OPEN_DELIMITER);
    block.push('\n');
    block
}
