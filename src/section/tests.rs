use super::*;

fn ids(sections: &[Section]) -> Vec<&str> {
    sections.iter().map(|section| section.id.as_str()).collect()
}

#[test]
fn slugify_lowercases_and_hyphenates() {
    assert_eq!(slugify("Hello, World!"), "hello-world");
    assert_eq!(slugify("  Supply   and Demand "), "supply-and-demand");
    assert_eq!(slugify("A & B"), "a-b");
    assert_eq!(slugify("Pre-trade_checks"), "pre-trade_checks");
    assert_eq!(slugify("!!!"), "section");
}

#[test]
fn slugify_collapses_adjacent_hyphens() {
    assert_eq!(slugify("A - B"), "a-b");
    assert_eq!(slugify("A--B"), "a-b");
    assert_eq!(slugify("Before -- after -"), "before-after-");
    assert_eq!(slugify("- item"), "-item");
}

#[test]
fn slugify_keeps_non_latin_letters() {
    assert_eq!(slugify("供给与需求"), "供给与需求");
    assert_eq!(slugify("Économie Générale"), "économie-générale");
}

#[test]
fn parse_nests_by_level() {
    let text = "## A\n\nalpha\n\n### A1\n\nnested\n\n## B\n\nbeta\n";
    let sections = parse(text);

    assert_eq!(ids(&sections), vec!["a", "b"]);
    assert_eq!(sections[0].content, "\nalpha\n\n");
    assert_eq!(ids(&sections[0].subsections), vec!["a1"]);
    assert_eq!(sections[0].subsections[0].level, 3);
    assert_eq!(sections[1].content, "\nbeta\n");
}

#[test]
fn skipped_level_attaches_to_nearest_lower_heading() {
    let sections = parse("## Top\n#### Deep\n### Mid\n");

    assert_eq!(sections.len(), 1);
    assert_eq!(ids(&sections[0].subsections), vec!["deep", "mid"]);
    assert_eq!(sections[0].subsections[0].level, 4);
}

#[test]
fn content_excludes_descendant_text() {
    let text = "## Parent\n\nown\n\n### Child\n\nchild body\n";
    let sections = parse(text);

    assert!(!sections[0].content.contains("Child"));
    assert!(!sections[0].content.contains("child body"));
    assert_eq!(sections[0].render(), text);
}

#[test]
fn render_round_trips_document_bytes() {
    let text = "intro line\n\n## One\n\nbody\n### One.A\ntext\n## Two\nlast line without newline";
    assert_eq!(render_sections(&parse(text)), text);
}

#[test]
fn sibling_collisions_get_numeric_suffixes() {
    let sections = parse("## Notes\n## Notes\n## Notes-2\n## Notes\n");
    assert_eq!(ids(&sections), vec!["notes", "notes-2", "notes-2-2", "notes-3"]);
}

#[test]
fn same_heading_under_different_parents_keeps_plain_id() {
    let sections = parse("## A\n### Exercises\n## B\n### Exercises\n");
    assert_eq!(sections[0].subsections[0].id, "exercises");
    assert_eq!(sections[1].subsections[0].id, "exercises");
}

#[test]
fn fenced_heading_is_inert() {
    let text = "## Code\n\n```python\n# comment\n## not a heading\n```\n\n## After\n";
    let sections = parse(text);

    assert_eq!(ids(&sections), vec!["code", "after"]);
    assert!(sections[0].content.contains("## not a heading"));
}

#[test]
fn tilde_fence_requires_matching_marker() {
    let text = "## A\n~~~~\n```\n## hidden\n~~~~\n## B\n";
    let sections = parse(text);
    assert_eq!(ids(&sections), vec!["a", "b"]);
}

#[test]
fn math_block_hides_heading_like_lines() {
    let text = "## Model\n$$\n## x = y\n$$\n## Result\n$$ a = b $$\n## Tail\n";
    let sections = parse(text);
    assert_eq!(ids(&sections), vec!["model", "result", "tail"]);
}

#[test]
fn unclosed_fence_swallows_rest_and_warns() {
    let text = "## A\n```\n## B\n## C\n";
    let (sections, warnings) = parse_with_warnings(text);

    assert_eq!(ids(&sections), vec!["a"]);
    assert_eq!(
        warnings,
        vec![ParseWarning::UnclosedRegion {
            kind: RegionKind::Fence,
            line: 2
        }]
    );
    assert_eq!(render_sections(&sections), text);
}

#[test]
fn headless_document_is_single_preamble() {
    let text = "Just a paragraph.\n\n# Title only\n";
    let sections = parse(text);

    assert_eq!(sections.len(), 1);
    assert!(sections[0].is_preamble());
    assert_eq!(sections[0].id, PREAMBLE_ID);
    assert_eq!(sections[0].content, text);
}

#[test]
fn text_before_first_heading_becomes_preamble() {
    let sections = parse("# Title\n\nIntro.\n\n## First\n");
    assert_eq!(ids(&sections), vec![PREAMBLE_ID, "first"]);
    assert_eq!(sections[0].content, "# Title\n\nIntro.\n\n");
}

#[test]
fn heading_named_like_preamble_is_suffixed() {
    let sections = parse("intro\n## _preamble\n");
    assert_eq!(ids(&sections), vec![PREAMBLE_ID, "_preamble-2"]);
}

#[test]
fn heading_requires_space_and_at_most_six_hashes() {
    let sections = parse("##NoSpace\n####### seven\n## Real\n");
    assert_eq!(ids(&sections), vec![PREAMBLE_ID, "real"]);
}

#[test]
fn closing_hash_sequence_is_not_part_of_heading() {
    let sections = parse("## Title ##\n## C#\n");
    assert_eq!(sections[0].heading, "Title");
    assert_eq!(sections[1].heading, "C#");
}

#[test]
fn document_parse_splits_front_matter() {
    let text = "---\ntitle: x\n---\n## A\nbody\n";
    let document = Document::parse(text);

    assert_eq!(document.front_matter, "---\ntitle: x\n---\n");
    assert_eq!(ids(&document.sections), vec!["a"]);
}

#[test]
fn relevel_shifts_descendants_and_rewrites_heading_lines() {
    let mut section = parse("## A\n### B\n").remove(0);
    section.relevel(1);

    assert_eq!(section.level, 3);
    assert_eq!(section.heading_line, "### A\n");
    assert_eq!(section.subsections[0].heading_line, "#### B\n");
}

#[test]
fn qualify_key_joins_ids() {
    assert_eq!(qualify_key("", "a"), "a");
    assert_eq!(qualify_key("a/b", "c"), "a/b/c");
}
