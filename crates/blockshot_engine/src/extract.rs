use std::io;

use blockshot_core::{SkipClassSet, TextFragment};
use ego_tree::NodeRef;
use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use scraper::node::Node;
use scraper::{ElementRef, Html};

/// Elements whose content is never inspected for text or classes.
const IGNORED_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

pub trait BlockExtractor: Send + Sync {
    fn extract(&self, html: &str, skip_classes: &SkipClassSet) -> Vec<TextFragment>;
}

/// Emits the smallest elements that carry visible text, as outer HTML, in
/// document order.
///
/// An element qualifies when it is not inside a skipped class, has non-blank
/// text, and either owns a non-blank text node directly or has no child
/// elements at all. A qualifying element is emitted whole and its subtree is
/// not searched again, so mixed content is captured once at its outermost
/// level. Skipped descendants are cut out of the emitted markup.
#[derive(Debug, Default, Clone, Copy)]
pub struct LeafBlockExtractor;

impl BlockExtractor for LeafBlockExtractor {
    fn extract(&self, html: &str, skip_classes: &SkipClassSet) -> Vec<TextFragment> {
        if html.trim().is_empty() {
            return Vec::new();
        }

        // html5ever recovers from malformed markup; there is no error path.
        let document = Html::parse_fragment(html);
        let mut blocks = Vec::new();

        // `parse_fragment` wraps the input in a synthetic <html> element
        // which is not part of the resource.
        for child in document.root_element().children() {
            visit_node(child, skip_classes, &mut blocks);
        }

        blocks
    }
}

fn visit_node(node: NodeRef<'_, Node>, skip_classes: &SkipClassSet, blocks: &mut Vec<TextFragment>) {
    let Some(element) = ElementRef::wrap(node) else {
        return;
    };

    let name = element.value().name();
    if IGNORED_TAGS.iter().any(|tag| name.eq_ignore_ascii_case(tag)) {
        return;
    }

    // Descent stops at a skipped element, so an ancestor match is covered
    // by never reaching its descendants.
    if is_skipped(element, skip_classes) {
        return;
    }

    if is_leaf_block(element) {
        if let Some(markup) = pruned_html(element, skip_classes) {
            let markup = markup.trim();
            if !markup.is_empty() {
                blocks.push(TextFragment::new(markup));
                return;
            }
        }
    }

    for child in element.children() {
        visit_node(child, skip_classes, blocks);
    }
}

fn is_skipped(element: ElementRef<'_>, skip_classes: &SkipClassSet) -> bool {
    if skip_classes.is_empty() {
        return false;
    }
    element
        .value()
        .attr("class")
        .is_some_and(|classes| skip_classes.matches_attr(classes))
}

fn is_leaf_block(element: ElementRef<'_>) -> bool {
    let has_text = element
        .text()
        .any(|chunk| chunk.split_whitespace().next().is_some());
    if !has_text {
        return false;
    }

    let has_direct_text = element
        .children()
        .any(|child| matches!(child.value(), Node::Text(text) if !text.trim().is_empty()));
    if has_direct_text {
        return true;
    }

    !element
        .descendants()
        .skip(1)
        .any(|descendant| descendant.value().is_element())
}

/// Outer HTML of `element` with every skipped descendant subtree left out.
/// Same serializer settings as [`ElementRef::html`], so unpruned elements
/// come out byte-identical.
fn pruned_html(element: ElementRef<'_>, skip_classes: &SkipClassSet) -> Option<String> {
    let opts = SerializeOpts {
        scripting_enabled: false,
        traversal_scope: TraversalScope::IncludeNode,
        create_missing_parent: false,
    };
    let mut buf = Vec::new();
    serialize(
        &mut buf,
        &Pruned {
            element,
            skip_classes,
        },
        opts,
    )
    .ok()?;
    String::from_utf8(buf).ok()
}

struct Pruned<'a, 'b> {
    element: ElementRef<'a>,
    skip_classes: &'b SkipClassSet,
}

impl Serialize for Pruned<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: &mut S, _: TraversalScope) -> io::Result<()> {
        write_pruned(*self.element, self.skip_classes, serializer)
    }
}

fn write_pruned<S: Serializer>(
    node: NodeRef<'_, Node>,
    skip_classes: &SkipClassSet,
    serializer: &mut S,
) -> io::Result<()> {
    match node.value() {
        Node::Text(text) => serializer.write_text(text),
        Node::Comment(comment) => serializer.write_comment(comment),
        Node::Element(element) => {
            let attrs = element.attrs.iter().map(|(name, value)| (name, &value[..]));
            serializer.start_elem(element.name.clone(), attrs)?;
            for child in node.children() {
                if ElementRef::wrap(child).is_some_and(|child| is_skipped(child, skip_classes)) {
                    continue;
                }
                write_pruned(child, skip_classes, serializer)?;
            }
            serializer.end_elem(element.name.clone())
        }
        _ => Ok(()),
    }
}
