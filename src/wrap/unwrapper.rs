//! Removing highlight elements.

use super::MARK_ATTRIBUTE;
use crate::config::WrapSettings;
use crate::error::Result;
use crate::tree::{ContentTree, NodeId, Selector, SelectorList};
use indexmap::IndexSet;

/// Finds and removes highlight elements created by the wrapper.
#[derive(Debug, Clone)]
pub struct Unwrapper {
    target: Selector,
    exclude: SelectorList,
}

impl Unwrapper {
    /// Match `settings.element` carrying every class of `settings.class_name`.
    pub fn new(settings: &WrapSettings) -> Result<Self> {
        let mut target = Selector::tag(&settings.element).with_attribute(MARK_ATTRIBUTE);
        for class in settings.class_name.split_whitespace() {
            target = target.with_class(class);
        }
        Ok(Self {
            target,
            exclude: SelectorList::parse(settings.exclude.as_slice())?,
        })
    }

    /// Is `node` a highlight element this unwrapper removes?
    pub fn is_target(&self, tree: &ContentTree, node: NodeId) -> bool {
        tree.element(node).is_some_and(|data| self.target.matches_element(data))
    }

    /// Highlight elements under `root` in document order, nested ones included.
    pub fn find(&self, tree: &ContentTree, root: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut current = tree.first_child(root);
        while let Some(node) = current {
            let mut descend = tree.element(node).is_some();
            if descend && self.exclude.matches(tree, node) {
                descend = false;
            } else if self.is_target(tree, node) {
                found.push(node);
            }
            current = tree.following(node, root, descend);
        }
        log::debug!("Found {} highlight elements under {}", found.len(), root);
        found
    }

    /// Replace each element by its children; returns the parents that changed.
    pub fn unwrap_all(&self, tree: &mut ContentTree, elements: &[NodeId]) -> Result<IndexSet<NodeId>> {
        let mut touched = IndexSet::new();
        for &element in elements {
            if !tree.is_attached(element) {
                continue;
            }
            touched.insert(tree.unwrap(element)?);
        }
        Ok(touched)
    }

    /// Merge text fragments left behind in `parents`; returns the merge count.
    pub fn normalize(&self, tree: &mut ContentTree, parents: &IndexSet<NodeId>) -> Result<usize> {
        let mut merged = 0;
        for &parent in parents {
            if tree.get(parent).is_some() {
                merged += tree.merge_text_siblings(parent)?;
            }
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unmark(markup: &str, settings: &WrapSettings) -> (String, usize) {
        let mut tree = ContentTree::parse_fragment(markup).unwrap();
        let unwrapper = Unwrapper::new(settings).unwrap();
        let root = tree.root();
        let found = unwrapper.find(&tree, root);
        let touched = unwrapper.unwrap_all(&mut tree, &found).unwrap();
        unwrapper.normalize(&mut tree, &touched).unwrap();
        (tree.inner_markup(root), found.len())
    }

    #[test]
    fn test_unwrap_and_merge() {
        let (markup, removed) = unmark(
            r#"<p>lorem <mark data-mark="true">ipsum</mark> dolor</p>"#,
            &WrapSettings::default(),
        );
        assert_eq!(removed, 1);
        assert_eq!(markup, "<p>lorem ipsum dolor</p>");
    }

    #[test]
    fn test_foreign_marks_survive() {
        let (markup, removed) = unmark(r#"<p>a<mark>b</mark>c</p>"#, &WrapSettings::default());
        assert_eq!(removed, 0);
        assert_eq!(markup, "<p>a<mark>b</mark>c</p>");
    }

    #[test]
    fn test_nested_and_class_filtered() {
        let settings = WrapSettings {
            class_name: "hl".into(),
            ..WrapSettings::default()
        };
        let (markup, removed) = unmark(
            concat!(
                r#"<p><mark class="hl" data-mark="true">a<mark class="hl" data-mark="true">b</mark></mark>"#,
                r#"<mark class="other" data-mark="true">c</mark></p>"#
            ),
            &settings,
        );
        assert_eq!(removed, 2);
        assert_eq!(markup, r#"<p>ab<mark class="other" data-mark="true">c</mark></p>"#);
    }

    #[test]
    fn test_nested_foreign_element_keeps_identity() {
        let mut tree = ContentTree::parse_fragment(r#"<p><mark data-mark="true">a<i>b</i></mark></p>"#).unwrap();
        let root = tree.root();
        let italic = tree
            .descendants(root)
            .find(|&n| tree.element(n).is_some_and(|e| e.tag == "i"))
            .unwrap();
        let unwrapper = Unwrapper::new(&WrapSettings::default()).unwrap();
        let found = unwrapper.find(&tree, root);
        unwrapper.unwrap_all(&mut tree, &found).unwrap();
        assert!(tree.is_attached(italic));
        assert_eq!(tree.inner_markup(root), "<p>a<i>b</i></p>");
    }

    #[test]
    fn test_excluded_subtree_is_left_alone() {
        let settings = WrapSettings {
            exclude: vec!["code".into()],
            ..WrapSettings::default()
        };
        let (markup, removed) = unmark(
            r#"<code><mark data-mark="true">x</mark></code><mark data-mark="true">y</mark>"#,
            &settings,
        );
        assert_eq!(removed, 1);
        assert_eq!(markup, r#"<code><mark data-mark="true">x</mark></code>y"#);
    }
}
