// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Comparing two renders of the same component.
//!
//! [`diff`] only looks at the two [`Node`] trees, the [`dom`](crate::dom) module
//! then applies the resulting [`Patch`] to whatever is mounted.

use crate::runtime::{EventId, Listener};
use crate::view::Node;

/// What has to happen to a mounted node to match the new view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Patch {
    Keep,
    /// Same text node, new content.
    Text,
    /// Same tag and child count, patch in place.
    Element {
        listener: Option<Rebind>,
        children: Vec<Patch>,
    },
    /// Shape changed, build a fresh node.
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rebind {
    Set(EventId),
    Remove,
}

pub(crate) fn diff(old: &Node, new: &Node) -> Patch {
    match (old, new) {
        (Node::Text(old), Node::Text(new)) => {
            if old == new {
                Patch::Keep
            } else {
                Patch::Text
            }
        }
        (Node::Element(old), Node::Element(new))
            if old.tag() == new.tag() && old.children().len() == new.children().len() =>
        {
            let children: Vec<Patch> = old
                .children()
                .iter()
                .zip(new.children())
                .map(|(old, new)| diff(old, new))
                .collect();

            let was = old.onclick().map(Listener::eid);
            let listener = match new.onclick().map(Listener::eid) {
                eid if eid == was => None,
                Some(eid) => Some(Rebind::Set(eid)),
                None => Some(Rebind::Remove),
            };

            if listener.is_none() && children.iter().all(|patch| *patch == Patch::Keep) {
                Patch::Keep
            } else {
                Patch::Element { listener, children }
            }
        }
        _ => Patch::Replace,
    }
}
