//! Integration tests for the public query API and for trees other than
//! `thicket_dom::DomTree`.

use std::cell::Cell;
use std::collections::HashMap;

use thicket_dom::{DomTree, ElementData, NodeId};
use thicket_select::{
    CompileOptions, CompiledQuery, QueryCache, SelectMode, SelectorError, SelectorList,
    SelectorTree, SiblingPosition, SyntaxErrorKind, compile, compile_with, select_all, select_one,
};

/// A minimal tree that tracks element positions and ids itself and counts
/// how often the engine asks for children.
#[derive(Default)]
struct TableTree {
    nodes: Vec<TableNode>,
    ids: Option<HashMap<String, Vec<usize>>>,
    first_child_calls: Cell<usize>,
    element_index_calls: Cell<usize>,
}

struct TableNode {
    tag: Option<String>,
    text: Option<String>,
    attrs: Vec<(String, String)>,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl TableTree {
    fn new() -> Self {
        let mut tree = Self::default();
        tree.nodes.push(TableNode {
            tag: None,
            text: None,
            attrs: Vec::new(),
            parent: None,
            children: Vec::new(),
        });
        tree
    }

    fn add(&mut self, parent: usize, tag: &str, attrs: &[(&str, &str)]) -> usize {
        let id = self.nodes.len();
        self.nodes.push(TableNode {
            tag: Some(tag.to_string()),
            text: None,
            attrs: attrs
                .iter()
                .map(|&(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// A text node, or with `None` a node that is neither text nor element.
    fn add_leaf(&mut self, parent: usize, text: Option<&str>) -> usize {
        let id = self.nodes.len();
        self.nodes.push(TableNode {
            tag: None,
            text: text.map(str::to_string),
            attrs: Vec::new(),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    fn index_ids(&mut self) {
        let mut ids: HashMap<String, Vec<usize>> = HashMap::new();
        // Nodes are appended in document order.
        for (index, node) in self.nodes.iter().enumerate() {
            if let Some((_, value)) = node.attrs.iter().find(|(k, _)| k == "id") {
                ids.entry(value.clone()).or_default().push(index);
            }
        }
        self.ids = Some(ids);
    }

    fn sibling(&self, node: usize, offset: isize) -> Option<usize> {
        let siblings = &self.nodes[self.nodes[node].parent?].children;
        let position = siblings.iter().position(|&c| c == node)?;
        siblings.get(position.checked_add_signed(offset)?).copied()
    }
}

impl SelectorTree for TableTree {
    type Node = usize;

    fn is_element(&self, node: usize) -> bool {
        self.nodes[node].tag.is_some()
    }

    fn local_name(&self, node: usize) -> Option<&str> {
        self.nodes[node].tag.as_deref()
    }

    fn attribute(&self, node: usize, name: &str) -> Option<&str> {
        self.nodes[node]
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn parent(&self, node: usize) -> Option<usize> {
        self.nodes[node].parent
    }

    fn first_child(&self, node: usize) -> Option<usize> {
        self.first_child_calls.set(self.first_child_calls.get() + 1);
        self.nodes[node].children.first().copied()
    }

    fn next_sibling(&self, node: usize) -> Option<usize> {
        self.sibling(node, 1)
    }

    fn prev_sibling(&self, node: usize) -> Option<usize> {
        self.sibling(node, -1)
    }

    fn text(&self, node: usize) -> Option<&str> {
        self.nodes[node].text.as_deref()
    }

    fn element_index(&self, node: usize) -> Option<SiblingPosition> {
        self.element_index_calls
            .set(self.element_index_calls.get() + 1);
        let siblings: Vec<usize> = self.nodes[self.nodes[node].parent?]
            .children
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
            .collect();
        Some(SiblingPosition {
            index: siblings.iter().position(|&c| c == node)? + 1,
            count: siblings.len(),
        })
    }

    fn elements_with_id(&self, id: &str) -> Option<&[usize]> {
        let ids = self.ids.as_ref()?;
        Some(ids.get(id).map_or(&[], Vec::as_slice))
    }
}

fn sample_dom() -> (DomTree, Vec<NodeId>) {
    let mut tree = DomTree::new();
    let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
    let mut items = Vec::new();
    for i in 0..6 {
        let class = if i % 2 == 0 { "even" } else { "odd" };
        let section =
            tree.append_element(body, ElementData::new("section").with_attr("class", class));
        items.push(section);
        items.push(tree.append_element(section, ElementData::new("p")));
    }
    (tree, items)
}

#[test]
fn test_compiled_and_text_queries_agree() {
    let (tree, _) = sample_dom();
    for text in ["section.even > p", "p", ":nth-child(3n)", "section + section p"] {
        let compiled = compile(text).unwrap();
        let from_text = select_all(text, &tree, NodeId::ROOT).unwrap();
        let from_compiled = select_all(&compiled, &tree, NodeId::ROOT).unwrap();
        assert_eq!(from_text, from_compiled, "{text}");
        assert_eq!(compiled.select_all(&tree, NodeId::ROOT), from_text, "{text}");
        assert_eq!(
            select_one(&compiled, &tree, NodeId::ROOT).unwrap(),
            from_text.first().copied(),
            "{text}"
        );
    }

    let owned = String::from("section p");
    assert_eq!(
        select_all(&owned, &tree, NodeId::ROOT).unwrap().len(),
        6
    );
}

#[test]
fn test_repeated_queries_are_identical() {
    let (tree, _) = sample_dom();
    let query = compile("section:nth-of-type(odd) p").unwrap();
    let first = query.select_all(&tree, NodeId::ROOT);
    let second = query.select_all(&tree, NodeId::ROOT);
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[test]
fn test_select_iter_and_modes() {
    let (tree, items) = sample_dom();
    let query = compile("section").unwrap();

    let all: Vec<NodeId> = query.select_iter(&tree, NodeId::ROOT).collect();
    assert_eq!(all, query.select_all(&tree, NodeId::ROOT));
    assert_eq!(all.len(), 6);
    assert_eq!(query.select_iter(&tree, NodeId::ROOT).next(), Some(items[0]));

    assert_eq!(
        query.select(&tree, &[NodeId::ROOT], SelectMode::First),
        vec![items[0]]
    );
    assert_eq!(
        query.select(&tree, &[NodeId::ROOT], SelectMode::All),
        all
    );
    assert_eq!(SelectMode::default(), SelectMode::All);
}

#[test]
fn test_select_iter_is_lazy() {
    let mut tree = TableTree::new();
    let root = tree.add(0, "main", &[]);
    for _ in 0..50 {
        let div = tree.add(root, "div", &[]);
        let _ = tree.add(div, "span", &[]);
    }
    let query = compile("div").unwrap();

    let _ = query.select_iter(&tree, root).next();
    let lazy_calls = tree.first_child_calls.replace(0);
    let _ = query.select_all(&tree, root);
    let full_calls = tree.first_child_calls.get();
    assert!(lazy_calls < full_calls, "{lazy_calls} >= {full_calls}");
}

#[test]
fn test_custom_tree_uses_element_index() {
    let mut tree = TableTree::new();
    let ul = tree.add(0, "ul", &[]);
    let li: Vec<usize> = (0..5).map(|_| tree.add(ul, "li", &[])).collect();

    let query = compile("li:nth-child(2n+1)").unwrap();
    assert_eq!(query.select_all(&tree, ul), vec![li[0], li[2], li[4]]);
    assert!(tree.element_index_calls.get() > 0);
    assert!(query.needs_sibling_positions());
    assert_eq!(
        compile("li:last-of-type").unwrap().select_all(&tree, ul),
        vec![li[4]]
    );
}

#[test]
fn test_custom_tree_empty_reads_text_children() {
    let mut tree = TableTree::new();
    let body = tree.add(0, "body", &[]);
    let worded = tree.add(body, "p", &[]);
    let _ = tree.add_leaf(worded, Some("hello"));
    let blank = tree.add(body, "p", &[]);
    let _ = tree.add_leaf(blank, Some(" \n"));
    let annotated = tree.add(body, "p", &[]);
    let _ = tree.add_leaf(annotated, None);
    let bare = tree.add(body, "p", &[]);

    let query = compile("p:empty").unwrap();
    assert_eq!(query.select_all(&tree, 0), vec![blank, annotated, bare]);
    assert!(!query.matches(&tree, worded));
    assert_eq!(
        compile("p:nth-child(3)").unwrap().select_all(&tree, 0),
        vec![annotated]
    );
}

#[test]
fn test_id_seeded_query_does_not_walk() {
    let mut tree = TableTree::new();
    let body = tree.add(0, "body", &[]);
    let a = tree.add(body, "div", &[("id", "a")]);
    let inner = tree.add(a, "p", &[("id", "b")]);
    let b = tree.add(body, "div", &[("id", "b")]);
    tree.index_ids();

    let query = compile("#b, div#a").unwrap();
    assert_eq!(query.select_all(&tree, 0), vec![a, inner, b]);
    assert_eq!(tree.first_child_calls.get(), 0);

    let options = CompileOptions {
        use_id_index: false,
        ..CompileOptions::default()
    };
    let walked = compile_with("#b, div#a", &options).unwrap();
    assert_eq!(walked.select_all(&tree, 0), vec![a, inner, b]);
    assert!(tree.first_child_calls.get() > 0);
}

#[test]
fn test_query_cache_reuses_compilations() {
    let (tree, _) = sample_dom();
    let mut cache = QueryCache::new(8);

    let first = cache.get_or_compile("section.odd p").unwrap();
    let second = cache.get_or_compile("section.odd p").unwrap();
    assert_eq!(
        first.select_all(&tree, NodeId::ROOT),
        second.select_all(&tree, NodeId::ROOT)
    );
    assert_eq!(cache.stats().hits, 1);
    assert_eq!(cache.stats().misses, 1);
    assert_eq!(cache.stats().lookups(), 2);

    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.stats().lookups(), 2);
}

#[test]
fn test_query_cache_uses_its_options() {
    let mut tree = DomTree::new();
    let _ = tree.append_element(NodeId::ROOT, ElementData::new("DIV"));
    let options = CompileOptions {
        case_sensitive_names: true,
        ..CompileOptions::default()
    };
    let mut cache = QueryCache::with_options(4, options.clone());
    assert_eq!(cache.options(), &options);
    assert_eq!(cache.capacity(), 4);
    assert!(cache
        .get_or_compile("div")
        .unwrap()
        .select_all(&tree, NodeId::ROOT)
        .is_empty());
}

#[test]
fn test_compiled_query_accessors() {
    let query = compile("ul > li, p").unwrap();
    assert_eq!(query.source(), "ul > li, p");
    assert_eq!(query.selector_list().selectors.len(), 2);
    assert!(!query.is_subject_only());
    assert!(!query.needs_sibling_positions());
    assert!(compile("p.a, #b").unwrap().is_subject_only());
}

#[test]
fn test_compiled_query_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CompiledQuery>();

    let (tree, _) = sample_dom();
    let query = compile("section p").unwrap();
    let expected = query.select_all(&tree, NodeId::ROOT);
    let (query, tree) = (&query, &tree);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(move || query.select_all(tree, NodeId::ROOT)))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_nesting_limit_is_configurable() {
    let options = CompileOptions {
        max_nesting_depth: 1,
        ..CompileOptions::default()
    };
    assert!(compile_with(":not(a)", &options).is_ok());
    let err = compile_with(":not(:is(a))", &options).unwrap_err();
    assert_eq!(
        err,
        SelectorError::Syntax {
            position: 5,
            kind: SyntaxErrorKind::NestingTooDeep(1),
        }
    );
    assert_eq!(err.position(), 5);
}

#[test]
#[should_panic(expected = "no selectors")]
fn test_empty_selector_list_panics() {
    let (tree, _) = sample_dom();
    let query = CompiledQuery::from_selector_list(
        "",
        SelectorList {
            selectors: Vec::new(),
        },
        &CompileOptions::default(),
    );
    let _ = query.select_all(&tree, NodeId::ROOT);
}
