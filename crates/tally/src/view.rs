// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Views
//!
//! A [`Node`] is a plain description of what should be on the page. Rendering a
//! component produces a fresh tree every time, and the [`dom`](crate::dom) module
//! reconciles it against what is already mounted.
//!
//! Trees are compared structurally. Two renders of the same state produce equal trees,
//! which is what makes [`Component::render`](crate::Component::render) safe to call
//! as often as the runtime wants.

use std::fmt::{self, Display, Write};

use crate::runtime::Listener;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(Text),
    Element(Element),
}

/// Owned text content of a [`Node`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Text(String);

impl Text {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Text {
    fn from(text: &str) -> Self {
        Text(text.to_owned())
    }
}

impl From<String> for Text {
    fn from(text: String) -> Self {
        Text(text)
    }
}

macro_rules! impl_int {
    ($($int:ty),*) => {
        $(
            impl From<$int> for Text {
                fn from(n: $int) -> Self {
                    Text(itoa::Buffer::new().format(n).to_owned())
                }
            }

            impl From<$int> for Node {
                fn from(n: $int) -> Self {
                    Node::Text(n.into())
                }
            }
        )*
    };
}

impl_int!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.into())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Text(text.into())
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// An HTML element with children and an optional click handler.
///
/// ```
/// use tally::view::{Element, Node};
///
/// let node: Node = Element::new("p").child("Answer: ").child(42).into();
///
/// assert_eq!(node.to_string(), "<p>Answer: 42</p>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: &'static str,
    children: Vec<Node>,
    onclick: Option<Listener>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Element {
            tag,
            children: Vec::new(),
            onclick: None,
        }
    }

    /// Append a child node.
    pub fn child<N>(mut self, child: N) -> Self
    where
        N: Into<Node>,
    {
        self.children.push(child.into());
        self
    }

    /// Fire the bound handler whenever this element is clicked.
    pub fn on_click(mut self, listener: Listener) -> Self {
        self.onclick = Some(listener);
        self
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn onclick(&self) -> Option<Listener> {
        self.onclick
    }
}

impl Node {
    /// All text in the tree, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text.as_str()),
            Node::Element(el) => {
                for child in &el.children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Compact description of the tree where every clickable element shows up as
    /// `[label]`. Whitespace is collapsed.
    ///
    /// ```
    /// use tally::prelude::*;
    ///
    /// let mut ctx = Ctx::<()>::new();
    /// let onclick = ctx.bind(|_: &mut ()| Then::Stop);
    ///
    /// let node: Node = Element::new("div")
    ///     .child(7)
    ///     .child("  ")
    ///     .child(Element::new("button").on_click(onclick).child("Go"))
    ///     .into();
    ///
    /// assert_eq!(node.summary(), "7 [Go]");
    /// ```
    pub fn summary(&self) -> String {
        let mut raw = String::new();
        self.collect_summary(&mut raw);

        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn collect_summary(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text.as_str()),
            Node::Element(el) if el.onclick.is_some() => {
                out.push('[');
                self.collect_text(out);
                out.push(']');
            }
            Node::Element(el) => {
                for child in &el.children {
                    child.collect_summary(out);
                }
            }
        }
    }

    /// Every element with a click handler, as `(label, listener)` pairs in document order.
    pub fn controls(&self) -> Vec<(String, Listener)> {
        let mut out = Vec::new();
        self.collect_controls(&mut out);
        out
    }

    fn collect_controls(&self, out: &mut Vec<(String, Listener)>) {
        if let Node::Element(el) = self {
            if let Some(listener) = el.onclick {
                out.push((self.text_content(), listener));
            }

            for child in &el.children {
                child.collect_controls(out);
            }
        }
    }
}

struct Escaped<'a>(&'a str);

impl Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '&' => f.write_str("&amp;")?,
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                c => f.write_char(c)?,
            }
        }

        Ok(())
    }
}

/// Writes the tree as HTML. Listeners are not part of the output.
impl Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text(text) => Escaped(text.as_str()).fmt(f),
            Node::Element(el) => {
                write!(f, "<{}>", el.tag)?;

                for child in &el.children {
                    child.fmt(f)?;
                }

                write!(f, "</{}>", el.tag)
            }
        }
    }
}
