//! Tests for marking explicit character ranges.

use tree_marker::{
    ContentTree, ElementInfo, MarkHooks, MarkSummary, Marker, MatchInfo, MatchSource, NoHooks, NodeId, RangeOptions,
    RangeSpec,
};

#[derive(Default)]
struct RangeHooks {
    sources: Vec<MatchSource>,
    texts: Vec<String>,
    dropped: Vec<String>,
    elements: usize,
}

impl MarkHooks for RangeHooks {
    fn accept(&mut self, info: &MatchInfo<'_>) -> bool {
        self.sources.push(info.source);
        self.texts.push(info.text.to_string());
        true
    }

    fn each(&mut self, _tree: &ContentTree, _element: NodeId, _info: &ElementInfo) {
        self.elements += 1;
    }

    fn no_match(&mut self, item: &str) {
        self.dropped.push(item.to_string());
    }
}

fn mark_ranges(markup: &str, ranges: &[RangeSpec], options: &RangeOptions) -> (ContentTree, MarkSummary, RangeHooks) {
    let mut tree = ContentTree::parse_fragment(markup).expect("valid markup");
    let mut marker = Marker::new(tree.root());
    let mut hooks = RangeHooks::default();
    let summary = marker
        .mark_ranges(&mut tree, ranges, options, &mut hooks)
        .expect("mark_ranges failed");
    (tree, summary, hooks)
}

fn count_marks(tree: &ContentTree) -> usize {
    tree.descendants(tree.root())
        .filter(|&n| tree.element(n).is_some_and(|e| e.tag == "mark"))
        .count()
}

mod overlap_policy {
    use super::*;

    #[test]
    fn test_overlapping_ranges_are_dropped() {
        let markup = format!("<p>{}</p>", "x".repeat(100));
        let ranges = vec![RangeSpec::new(40, 10), RangeSpec::new(25, 10), RangeSpec::new(20, 10)];
        let (tree, summary, hooks) = mark_ranges(&markup, &ranges, &RangeOptions::default());

        assert_eq!(summary.total_matches, 2);
        assert_eq!(count_marks(&tree), 2);
        assert_eq!(
            hooks.sources,
            vec![
                MatchSource::Range {
                    index: 2,
                    start: 20,
                    length: 10
                },
                MatchSource::Range {
                    index: 0,
                    start: 40,
                    length: 10
                },
            ]
        );
        assert_eq!(hooks.dropped, vec![r#"{"start":25,"length":10}"#]);
    }

    #[test]
    fn test_start_end_pairs_with_nested_overlaps() {
        let markup = format!("<p>{}</p>", "x".repeat(100));
        let ranges = vec![
            RangeSpec::with_end(20, 30),
            RangeSpec::with_end(25, 26),
            RangeSpec::with_end(40, 50),
            RangeSpec::with_end(45, 46),
        ];
        let (tree, summary, hooks) = mark_ranges(&markup, &ranges, &RangeOptions::default());
        assert_eq!(summary.total_matches, 2);
        assert_eq!(count_marks(&tree), 2);
        assert_eq!(hooks.dropped, vec![r#"{"start":25,"end":26}"#, r#"{"start":45,"end":46}"#]);
    }

    #[test]
    fn test_equal_starts_keep_first_listed() {
        let markup = format!("<p>{}</p>", "x".repeat(50));
        let ranges = vec![RangeSpec::new(10, 5), RangeSpec::new(10, 20)];
        let (_, summary, hooks) = mark_ranges(&markup, &ranges, &RangeOptions::default());
        assert_eq!(summary.total_matches, 1);
        assert_eq!(hooks.texts, vec!["xxxxx"]);
    }

    #[test]
    fn test_adjacent_ranges_both_accepted() {
        let (tree, summary, _) = mark_ranges(
            "<p>abcdef</p>",
            &[RangeSpec::new(0, 3), RangeSpec::new(3, 3)],
            &RangeOptions::default(),
        );
        assert_eq!(summary.total_matches, 2);
        assert_eq!(
            tree.inner_markup(tree.root()),
            r#"<p><mark data-mark="true">abc</mark><mark data-mark="true">def</mark></p>"#
        );
    }
}

mod wrap_all {
    use super::*;

    #[test]
    fn test_nested_ranges_split_into_nine_elements() {
        let text = "x".repeat(700);
        let markup = format!("<p>{}</p>", text);
        let ranges = vec![
            RangeSpec::new(20, 300),
            RangeSpec::new(20, 100),
            RangeSpec::new(90, 300),
            RangeSpec::new(90, 500),
        ];
        let options = RangeOptions::default().with_wrap_all_ranges(true);
        let (tree, summary, hooks) = mark_ranges(&markup, &ranges, &options);

        assert_eq!(summary.total_matches, 4);
        assert_eq!(summary.total_wraps, 9);
        assert_eq!(count_marks(&tree), 9);
        assert_eq!(hooks.elements, 9);
        assert_eq!(tree.text_content(tree.root()), text);
        assert!(hooks.dropped.is_empty());
    }

    #[test]
    fn test_wrap_all_without_overlap_matches_default() {
        let markup = "<p>lorem ipsum dolor</p>";
        let ranges = vec![RangeSpec::new(0, 5), RangeSpec::new(12, 5)];
        let (default_tree, _, _) = mark_ranges(markup, &ranges, &RangeOptions::default());
        let (all_tree, _, _) = mark_ranges(markup, &ranges, &RangeOptions::default().with_wrap_all_ranges(true));
        assert_eq!(
            default_tree.inner_markup(default_tree.root()),
            all_tree.inner_markup(all_tree.root())
        );
    }
}

mod coercion {
    use super::*;

    #[test]
    fn test_ranges_from_json() {
        let ranges: Vec<RangeSpec> =
            serde_json::from_str(r#"[{"start": "1", "length": 3}, {"start": 5.7, "end": "8px"}]"#).unwrap();
        let (_, summary, hooks) = mark_ranges("<p>0123456789</p>", &ranges, &RangeOptions::default());
        assert_eq!(summary.total_matches, 2);
        assert_eq!(hooks.texts, vec!["123", "567"]);
    }

    #[test]
    fn test_invalid_ranges_reported() {
        let ranges = vec![
            RangeSpec::new("abc", 3),
            RangeSpec::with_end(6, 2),
            RangeSpec::new(50, 5),
            RangeSpec::new(0, 4),
        ];
        let (_, summary, hooks) = mark_ranges("<p>lorem ipsum</p>", &ranges, &RangeOptions::default());
        assert_eq!(summary.total_matches, 1);
        assert_eq!(hooks.texts, vec!["lore"]);
        assert_eq!(hooks.dropped.len(), 3);
    }

    #[test]
    fn test_range_clamped_to_text() {
        let (_, summary, hooks) = mark_ranges(
            "<p>lorem</p>",
            &[RangeSpec::new(-2, 5), RangeSpec::new(4, 100)],
            &RangeOptions::default(),
        );
        assert_eq!(summary.total_matches, 2);
        assert_eq!(hooks.texts, vec!["lor", "m"]);
    }

    #[test]
    fn test_whitespace_only_range_dropped() {
        let (tree, summary, hooks) = mark_ranges("<p>ab   cd</p>", &[RangeSpec::new(2, 3)], &RangeOptions::default());
        assert_eq!(summary.total_matches, 0);
        assert_eq!(count_marks(&tree), 0);
        assert_eq!(hooks.dropped, vec![r#"{"start":2,"length":3}"#]);
    }
}

mod offsets {
    use super::*;

    #[test]
    fn test_offsets_count_characters() {
        let (_, _, hooks) = mark_ranges("<p>héllo wörld</p>", &[RangeSpec::new(6, 5)], &RangeOptions::default());
        assert_eq!(hooks.texts, vec!["wörld"]);
    }

    #[test]
    fn test_range_across_nodes() {
        let (tree, summary, _) = mark_ranges("<p>lorem <b>ipsum</b></p>", &[RangeSpec::new(3, 5)], &RangeOptions::default());
        assert_eq!(summary.total_matches, 1);
        assert_eq!(summary.total_wraps, 2);
        assert_eq!(
            tree.inner_markup(tree.root()),
            concat!(
                r#"<p>lor<mark data-mark="true" data-mark-part="0">em </mark>"#,
                r#"<b><mark data-mark="true" data-mark-part="1">ip</mark>sum</b></p>"#
            )
        );
    }

    #[test]
    fn test_empty_range_list() {
        let mut tree = ContentTree::parse_fragment("<p>lorem</p>").unwrap();
        let mut marker = Marker::new(tree.root());
        let summary = marker
            .mark_ranges(&mut tree, &[], &RangeOptions::default(), &mut NoHooks)
            .unwrap();
        assert_eq!(summary, MarkSummary::default());
        assert_eq!(tree.inner_markup(tree.root()), "<p>lorem</p>");
    }
}
