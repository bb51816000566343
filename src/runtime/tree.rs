// Copyright (c) 2018 Fabian Schuiki

//! The parse tree built by generated parsers.

use std::fmt;
use std::ops::Index;

use crate::{ParseError, Span, Token, TokenKind};

/// A unique node identifier within a parse tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Obtain the id as a usize.
    pub fn as_usize(self) -> usize {
        self.0
    }
}

/// A node of the parse tree.
#[derive(Debug, Clone)]
pub struct ParseNode<K> {
    /// The token this node was created for. For nonterminals this is an
    /// empty token that is widened as the routine consumes input.
    pub token: Token<K>,
    /// The text to display for this node.
    pub text: String,
    /// The parent node, if any.
    pub parent: Option<NodeId>,
    /// The child nodes in order.
    pub children: Vec<NodeId>,
}

/// A parse tree.
///
/// Nodes live in an arena and refer to each other by id. Errors found while
/// parsing are accumulated alongside the nodes.
#[derive(Debug, Clone)]
pub struct ParseTree<K> {
    nodes: Vec<ParseNode<K>>,
    /// The errors encountered while parsing.
    pub errors: Vec<ParseError>,
}

impl<K: TokenKind> ParseTree<K> {
    /// Create a tree that only consists of a root node.
    pub fn new() -> ParseTree<K> {
        ParseTree {
            nodes: vec![ParseNode {
                token: Token::new(K::root(), Span::none(), ""),
                text: "ParseTree".into(),
                parent: None,
                children: Vec::new(),
            }],
            errors: Vec::new(),
        }
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Add a child node below `parent`.
    pub fn create_node<S: Into<String>>(&mut self, parent: NodeId, token: Token<K>, text: S) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ParseNode {
            token,
            text: text.into(),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Add a scanned token as child of `node` and widen the node to cover it.
    pub fn add_token(&mut self, node: NodeId, token: &Token<K>) -> NodeId {
        let text = token.to_string();
        let child = self.create_node(node, token.clone(), text);
        self.nodes[node.0].token.span.widen(&token.span);
        child
    }

    /// Widen the span of `target` to cover the span of `from`.
    pub fn widen(&mut self, target: NodeId, from: NodeId) {
        let span = self.nodes[from.0].token.span.clone();
        self.nodes[target.0].token.span.widen(&span);
    }

    /// Record an error.
    pub fn error(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Access a node.
    pub fn node(&self, id: NodeId) -> &ParseNode<K> {
        &self.nodes[id.0]
    }

    /// The number of nodes in the tree, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree only consists of its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Find the `index`-th child of `node` with the given kind.
    pub fn nth_child(&self, node: NodeId, kind: K, index: usize) -> Option<NodeId> {
        self.nodes[node.0]
            .children
            .iter()
            .cloned()
            .filter(|&c| self.nodes[c.0].token.kind == kind)
            .nth(index)
    }

    /// Iterate over all nodes in depth-first order, with their depth.
    pub fn walk(&self) -> Vec<(usize, NodeId)> {
        let mut out = Vec::new();
        let mut stack = vec![(0, self.root())];
        while let Some((depth, id)) = stack.pop() {
            out.push((depth, id));
            for &child in self.nodes[id.0].children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }
}

impl<K: TokenKind> Default for ParseTree<K> {
    fn default() -> ParseTree<K> {
        ParseTree::new()
    }
}

impl<K> Index<NodeId> for ParseTree<K> {
    type Output = ParseNode<K>;
    fn index(&self, idx: NodeId) -> &ParseNode<K> {
        &self.nodes[idx.0]
    }
}

impl<K: TokenKind> fmt::Display for ParseTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (depth, id) in self.walk() {
            writeln!(f, "{:width$}{}", "", self.nodes[id.0].text, width = depth * 2)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Kind {
        Root,
        Undetermined,
        Expr,
        Number,
    }

    impl TokenKind for Kind {
        fn undetermined() -> Kind {
            Kind::Undetermined
        }
        fn root() -> Kind {
            Kind::Root
        }
    }

    fn tok(kind: Kind, start: usize, end: usize, text: &str) -> Token<Kind> {
        Token::new(kind, Span::new(Arc::from("t"), start, end, 1, start + 1), text)
    }

    #[test]
    fn nodes_widen_over_tokens() {
        let mut tree = ParseTree::new();
        let root = tree.root();
        let expr = tree.create_node(root, tok(Kind::Expr, 2, 2, ""), "Expr");
        tree.add_token(expr, &tok(Kind::Number, 2, 4, "12"));
        tree.add_token(expr, &tok(Kind::Number, 5, 6, "3"));
        tree.widen(root, expr);
        assert_eq!((tree[expr].token.span.start, tree[expr].token.span.end), (2, 6));
        assert_eq!(tree[root].token.span.end, 6);
        assert_eq!(tree.nth_child(expr, Kind::Number, 1).map(|n| tree[n].text.clone()),
                   Some("Number '3'".to_string()));
        assert_eq!(tree.nth_child(expr, Kind::Number, 2), None);
    }

    #[test]
    fn display_indents_children() {
        let mut tree = ParseTree::new();
        let root = tree.root();
        let expr = tree.create_node(root, tok(Kind::Expr, 0, 0, ""), "Expr");
        tree.add_token(expr, &tok(Kind::Number, 0, 1, "1"));
        assert_eq!(format!("{}", tree), "ParseTree\n  Expr\n    Number '1'\n");
    }
}
