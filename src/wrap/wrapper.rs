//! Applying spans to the tree.
//!
//! The wrapper owns the offset table of one run. Spans must arrive sorted by
//! start. Segments ending before the current span are retired, so only the
//! front of a deque of live segments is ever touched. Wrapping replaces a
//! segment by its prefix, inner and suffix pieces, which lets later spans
//! that nest in or overlap an earlier one split the new leaves again.

use super::{MARK_ATTRIBUTE, PART_ATTRIBUTE};
use crate::config::WrapSettings;
use crate::error::Result;
use crate::text::{LogicalString, Segment};
use crate::tree::{ContentTree, ElementData, NodeId};
use std::collections::VecDeque;

/// Splits text nodes and inserts highlight elements.
#[derive(Debug)]
pub struct Wrapper {
    element: String,
    class_name: String,
    text: String,
    retired: Vec<Segment>,
    live: VecDeque<Segment>,
    wraps: usize,
}

impl Wrapper {
    /// Start wrapping over a flattened snapshot.
    pub fn new(logical: LogicalString, settings: &WrapSettings) -> Self {
        let (text, segments) = logical.into_parts();
        Self {
            element: settings.element.clone(),
            class_name: settings.class_name.clone(),
            text,
            retired: Vec::with_capacity(segments.len()),
            live: segments.into(),
            wraps: 0,
        }
    }

    /// Logical text of `[start, end)`.
    pub fn text(&self, start: usize, end: usize) -> &str {
        &self.text[start..end]
    }

    /// Elements created so far.
    pub fn wraps(&self) -> usize {
        self.wraps
    }

    fn retire_before(&mut self, offset: usize) {
        while self.live.front().is_some_and(|seg| seg.end <= offset) {
            if let Some(seg) = self.live.pop_front() {
                self.retired.push(seg);
            }
        }
    }

    /// Number of elements wrapping `[start, end)` would create.
    pub fn parts(&mut self, start: usize, end: usize) -> usize {
        if start >= end {
            return 0;
        }
        self.retire_before(start);
        self.live.iter().take_while(|seg| seg.start < end).count()
    }

    fn element_data(&self, part: usize, parts: usize) -> ElementData {
        let mut data = ElementData::new(self.element.as_str())
            .with_class(&self.class_name)
            .with_attribute(MARK_ATTRIBUTE, "true");
        if parts > 1 {
            data = data.with_attribute(PART_ATTRIBUTE, part.to_string());
        }
        data
    }

    /// Wrap `[start, end)`, one element per covered segment.
    ///
    /// `each` receives every created element with its part index and the
    /// number of parts. Returns the number of elements created.
    pub fn wrap_span<F>(&mut self, tree: &mut ContentTree, start: usize, end: usize, mut each: F) -> Result<usize>
    where
        F: FnMut(&ContentTree, NodeId, usize, usize),
    {
        let parts = self.parts(start, end);
        if parts == 0 {
            return Ok(0);
        }
        let covered: Vec<Segment> = self.live.drain(..parts).collect();
        let mut pieces = Vec::with_capacity(parts + 2);

        for (part, seg) in covered.into_iter().enumerate() {
            let local_start = start.max(seg.start) - seg.start;
            let local_end = end.min(seg.end) - seg.start;

            let mut inner = seg.node;
            if local_start > 0 {
                inner = tree.split_text(seg.node, local_start)?;
                pieces.push(Segment {
                    node: seg.node,
                    start: seg.start,
                    end: seg.start + local_start,
                });
            }
            let suffix = if seg.start + local_end < seg.end {
                Some(Segment {
                    node: tree.split_text(inner, local_end - local_start)?,
                    start: seg.start + local_end,
                    end: seg.end,
                })
            } else {
                None
            };

            let element = tree.create_element(self.element_data(part, parts));
            tree.wrap(inner, element)?;
            pieces.push(Segment {
                node: inner,
                start: seg.start + local_start,
                end: seg.start + local_end,
            });
            pieces.extend(suffix);
            self.wraps += 1;
            each(tree, element, part, parts);
        }

        for piece in pieces.into_iter().rev() {
            self.live.push_front(piece);
        }
        Ok(parts)
    }

    /// Offset table after wrapping, for reuse by a later run.
    pub fn finish(mut self) -> LogicalString {
        log::debug!("Wrapper created {} elements", self.wraps);
        self.retired.extend(self.live.drain(..));
        LogicalString::from_parts(self.text, self.retired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::NodeCollector;
    use crate::tree::SelectorList;

    fn setup(markup: &str) -> (ContentTree, Wrapper) {
        let tree = ContentTree::parse_fragment(markup).unwrap();
        let exclude = SelectorList::default();
        let nodes = NodeCollector::new(&exclude).collect(&tree, tree.root());
        let logical = LogicalString::build(&tree, &nodes);
        (tree, Wrapper::new(logical, &WrapSettings::default()))
    }

    #[test]
    fn test_wrap_inside_one_node() {
        let (mut tree, mut wrapper) = setup("<p>lorem ipsum dolor</p>");
        let created = wrapper.wrap_span(&mut tree, 6, 11, |_, _, _, _| {}).unwrap();
        assert_eq!(created, 1);
        assert_eq!(
            tree.inner_markup(tree.root()),
            r#"<p>lorem <mark data-mark="true">ipsum</mark> dolor</p>"#
        );
        let logical = wrapper.finish();
        assert!(logical.is_consistent());
        assert_eq!(logical.segments().len(), 3);
    }

    #[test]
    fn test_wrap_across_nodes_tags_parts() {
        let (mut tree, mut wrapper) = setup("<p>lor<b>em</b> ipsum</p>");
        let mut seen = Vec::new();
        wrapper
            .wrap_span(&mut tree, 0, 5, |t, el, part, parts| {
                seen.push((t.text_content(el), part, parts));
            })
            .unwrap();
        assert_eq!(seen, vec![("lor".to_string(), 0, 2), ("em".to_string(), 1, 2)]);
        assert_eq!(
            tree.inner_markup(tree.root()),
            concat!(
                r#"<p><mark data-mark="true" data-mark-part="0">lor</mark>"#,
                r#"<b><mark data-mark="true" data-mark-part="1">em</mark></b> ipsum</p>"#
            )
        );
    }

    #[test]
    fn test_consecutive_spans_in_one_node() {
        let (mut tree, mut wrapper) = setup("<p>aXbXc</p>");
        wrapper.wrap_span(&mut tree, 1, 2, |_, _, _, _| {}).unwrap();
        wrapper.wrap_span(&mut tree, 3, 4, |_, _, _, _| {}).unwrap();
        assert_eq!(
            tree.inner_markup(tree.root()),
            r#"<p>a<mark data-mark="true">X</mark>b<mark data-mark="true">X</mark>c</p>"#
        );
        assert_eq!(tree.text_content(tree.root()), "aXbXc");
    }

    #[test]
    fn test_nested_spans_split_again() {
        let text = "x".repeat(700);
        let (mut tree, mut wrapper) = setup(&format!("<p>{}</p>", text));
        let mut total = 0;
        for (start, end) in [(20, 320), (20, 120), (90, 390), (90, 590)] {
            total += wrapper.wrap_span(&mut tree, start, end, |_, _, _, _| {}).unwrap();
        }
        assert_eq!(total, 9);
        assert_eq!(wrapper.wraps(), 9);
        assert_eq!(tree.text_content(tree.root()), text);
        assert!(wrapper.finish().is_consistent());
    }

    #[test]
    fn test_class_name_and_element() {
        let mut tree = ContentTree::parse_fragment("<p>lorem</p>").unwrap();
        let exclude = SelectorList::default();
        let nodes = NodeCollector::new(&exclude).collect(&tree, tree.root());
        let settings = WrapSettings {
            element: "span".into(),
            class_name: "hl".into(),
            ..WrapSettings::default()
        };
        let mut wrapper = Wrapper::new(LogicalString::build(&tree, &nodes), &settings);
        wrapper.wrap_span(&mut tree, 0, 5, |_, _, _, _| {}).unwrap();
        assert_eq!(
            tree.inner_markup(tree.root()),
            r#"<p><span class="hl" data-mark="true">lorem</span></p>"#
        );
    }

    #[test]
    fn test_empty_span_is_noop() {
        let (mut tree, mut wrapper) = setup("<p>lorem</p>");
        assert_eq!(wrapper.wrap_span(&mut tree, 2, 2, |_, _, _, _| {}).unwrap(), 0);
        assert_eq!(tree.inner_markup(tree.root()), "<p>lorem</p>");
    }
}
