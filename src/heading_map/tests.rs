use super::*;
use crate::diff::detect_changes;
use crate::section::parse;

fn map_of(pairs: &[(&str, &str)]) -> HeadingMap {
    pairs
        .iter()
        .map(|(key, heading)| (key.to_string(), heading.to_string()))
        .collect()
}

#[test]
fn extract_reads_quoted_and_plain_entries() {
    let document = "---\ntitle: Demo\nheading-map:\n  supply: \"供给\"\n  supply/elasticity: '弹性 ''价格'''\n  \"2024\": Plain value\n---\n## 供给\n";
    let map = extract(document);

    assert_eq!(map.get("supply"), Some("供给"));
    assert_eq!(map.get("supply/elasticity"), Some("弹性 '价格'"));
    assert_eq!(map.get("2024"), Some("Plain value"));
    assert_eq!(map.len(), 3);
}

#[test]
fn extract_without_block_is_empty() {
    assert!(extract("## A\nbody\n").is_empty());
    assert!(extract("---\ntitle: Demo\n---\n## A\n").is_empty());
    assert!(extract("---\nheading-map: {}\n---\n").is_empty());
}

#[test]
fn extract_stops_at_next_top_level_field() {
    let document = "---\nheading-map:\n  a: \"A'\"\nkernelspec:\n  name: python3\n---\n";
    let map = extract(document);
    assert_eq!(map, map_of(&[("a", "A'")]));
}

#[test]
fn inject_replaces_block_and_keeps_other_fields_in_order() {
    let document = "---\ntitle: Demo\nheading-map:\n  a: \"Old\"\nkernelspec:\n  name: python3\n---\n## A\n";
    let updated = inject(document, &map_of(&[("a", "New"), ("b", "Bee")]));

    assert_eq!(
        updated,
        "---\ntitle: Demo\nheading-map:\n  a: \"New\"\n  b: \"Bee\"\nkernelspec:\n  name: python3\n---\n## A\n"
    );
}

#[test]
fn inject_appends_field_when_missing() {
    let document = "---\ntitle: Demo\n---\nbody\n";
    let updated = inject(document, &map_of(&[("a", "A")]));
    assert_eq!(updated, "---\ntitle: Demo\nheading-map:\n  a: \"A\"\n---\nbody\n");
}

#[test]
fn inject_creates_front_matter_only_for_non_empty_map() {
    assert_eq!(inject("## A\n", &HeadingMap::new()), "## A\n");
    assert_eq!(
        inject("## A\n", &map_of(&[("a", "Ä")])),
        "---\nheading-map:\n  a: \"Ä\"\n---\n## A\n"
    );
}

#[test]
fn inject_with_empty_map_removes_field() {
    let document = "---\ntitle: Demo\nheading-map:\n  a: \"A\"\n---\n";
    assert_eq!(inject(document, &HeadingMap::new()), "---\ntitle: Demo\n---\n");
}

#[test]
fn inject_is_byte_identical_when_map_is_unchanged() {
    let document = "---\nheading-map:\n  a:   'A'   # kept as written\n---\n## A\n";
    let map = extract(document);
    assert_eq!(inject(document, &map), document);
}

#[test]
fn quoted_values_round_trip_through_inject_and_extract() {
    let map = map_of(&[
        ("a", "Quote \" and backslash \\"),
        ("needs quoting: yes", "Colon: inside"),
    ]);
    let document = inject("## A\n", &map);
    assert_eq!(extract(&document), map);
}

#[test]
fn extract_reads_flow_style_field() {
    let document = "---\nheading-map: {intro: \"Wstęp\", intro/setup: Instalacja}\n---\n## Wstęp\n";
    assert_eq!(
        extract(document),
        map_of(&[("intro", "Wstęp"), ("intro/setup", "Instalacja")])
    );
}

#[test]
fn inject_replaces_flow_style_field_without_duplicating_it() {
    let document = "---\ntitle: Demo\nheading-map: {intro: \"Old\"}\nlang: pl\n---\n## Old\n";
    let map = map_of(&[("intro", "Wstęp")]);
    let updated = inject(document, &map);

    assert_eq!(updated.matches("heading-map").count(), 1);
    assert_eq!(
        updated,
        "---\ntitle: Demo\nheading-map:\n  intro: \"Wstęp\"\nlang: pl\n---\n## Old\n"
    );
    assert_eq!(extract(&updated), map);
}

#[test]
fn inject_replaces_field_with_trailing_comment() {
    let document = "---\nheading-map: # managed\n  intro: \"Old\"\n---\n";
    let map = map_of(&[("intro", "Wstęp"), ("usage", "Użycie")]);
    let updated = inject(document, &map);

    assert_eq!(updated.matches("heading-map").count(), 1);
    assert_eq!(extract(&updated), map);
    assert_eq!(extract(document), map_of(&[("intro", "Old")]));
}

#[test]
fn keyword_like_keys_are_quoted_on_write() {
    let map = map_of(&[("null", "Brak"), ("true", "Prawda"), ("plain", "Zwykły")]);
    let document = inject("## A\n", &map);

    assert!(document.contains("  \"null\": \"Brak\"\n"));
    assert!(document.contains("  plain: \"Zwykły\"\n"));
    assert_eq!(extract(&document), map);
}

#[test]
fn update_sets_changed_drops_removed_and_keeps_unchanged() {
    let old = parse("## A\na\n## B\nb\n## C\nc\n");
    let new = parse("## A\na\n## B\nb edited\n## D\nd\n");
    let changes = detect_changes(&old, &new);

    let prior = map_of(&[("a", "A'"), ("b", "B'"), ("c", "C'"), ("stale", "S'")]);
    let resolved = map_of(&[("a", "A'"), ("b", "B''"), ("d", "D'")]);
    let updated = prior.update(&changes, &resolved);

    assert_eq!(updated, map_of(&[("a", "A'"), ("b", "B''"), ("d", "D'")]));
}

#[test]
fn update_covers_nested_keys_in_preorder() {
    let changes = detect_changes(&[], &parse("intro\n## A\n### A1\n## B\n"));
    let resolved = map_of(&[("b", "B'"), ("a/a1", "A1'"), ("a", "A'")]);
    let updated = HeadingMap::new().update(&changes, &resolved);

    assert_eq!(updated.keys().collect::<Vec<_>>(), vec!["a", "a/a1", "b"]);
}

#[test]
fn insert_overwrites_in_place() {
    let mut map = map_of(&[("a", "1"), ("b", "2")]);
    map.insert("a", "3");
    assert_eq!(map.entries()[0].heading, "3");
    assert_eq!(map.remove("b").as_deref(), Some("2"));
    assert_eq!(map.len(), 1);
}
