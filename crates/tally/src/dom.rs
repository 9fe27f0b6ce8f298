// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mounting components into the browser DOM.

use std::cell::RefCell;
use std::error::Error;
use std::fmt;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::Document;

use crate::diff::{diff, Patch, Rebind};
use crate::runtime::{EventId, Runtime, Then};
use crate::view::Node;
use crate::Component;

/// Index of a mounted app in this thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppId(usize);

/// Reasons [`start`] can fail.
#[derive(Debug)]
pub enum MountError {
    NoWindow,
    NoDocument,
    /// No element with this id exists in the document.
    MissingTarget(String),
    /// A DOM call threw.
    Js(JsValue),
}

impl fmt::Display for MountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountError::NoWindow => f.write_str("no global `window` exists"),
            MountError::NoDocument => f.write_str("`window` has no `document`"),
            MountError::MissingTarget(id) => write!(f, "no element with id `{id}` to mount into"),
            MountError::Js(err) => write!(f, "DOM error: {err:?}"),
        }
    }
}

impl Error for MountError {}

impl From<JsValue> for MountError {
    fn from(err: JsValue) -> Self {
        MountError::Js(err)
    }
}

impl From<MountError> for JsValue {
    fn from(err: MountError) -> Self {
        match err {
            MountError::Js(err) => err,
            err => JsValue::from_str(&err.to_string()),
        }
    }
}

trait Driver {
    fn trigger(&mut self, eid: EventId) -> Result<(), JsValue>;
}

struct App<C> {
    id: AppId,
    document: Document,
    target: web_sys::Element,
    runtime: Runtime<C>,
    root: Mounted,
}

impl<C> Driver for App<C>
where
    C: Component,
{
    fn trigger(&mut self, eid: EventId) -> Result<(), JsValue> {
        let old = self.runtime.view().clone();

        if let Some(Then::Render) = self.runtime.trigger(eid) {
            let new = self.runtime.view();
            let builder = Builder {
                app: self.id,
                document: &self.document,
            };

            self.root
                .apply(&diff(&old, new), new, &builder, self.target.as_ref())?;
        }

        Ok(())
    }
}

thread_local! {
    static APPS: RefCell<Vec<Box<dyn Driver>>> = const { RefCell::new(Vec::new()) };
}

/// Construct a component and mount it as the last child of the element with id `target_id`.
///
/// Every call mounts a separate instance with its own state.
pub fn start<C, F>(target_id: &str, construct: F) -> Result<AppId, MountError>
where
    C: Component,
    F: FnOnce() -> C,
{
    init_panic_hook();

    let document = web_sys::window()
        .ok_or(MountError::NoWindow)?
        .document()
        .ok_or(MountError::NoDocument)?;

    let target = document
        .get_element_by_id(target_id)
        .ok_or_else(|| MountError::MissingTarget(target_id.to_owned()))?;

    let id = APPS.with_borrow(|apps| AppId(apps.len()));
    let runtime = Runtime::new(construct());
    let root = Builder {
        app: id,
        document: &document,
    }
    .build(runtime.view())?;

    target.append_child(root.node())?;

    APPS.with_borrow_mut(|apps| {
        apps.push(Box::new(App {
            id,
            document,
            target,
            runtime,
            root,
        }))
    });

    Ok(id)
}

fn dispatch(app: AppId, eid: EventId) {
    let res = APPS.with(|apps| {
        let Ok(mut apps) = apps.try_borrow_mut() else {
            debug_assert!(false, "Cyclical update detected");
            return Ok(());
        };

        match apps.get_mut(app.0) {
            Some(app) => app.trigger(eid),
            None => Ok(()),
        }
    });

    // Thrown only after the registry borrow is released
    if let Err(err) = res {
        wasm_bindgen::throw_val(err);
    }
}

struct Builder<'a> {
    app: AppId,
    document: &'a Document,
}

impl Builder<'_> {
    fn build(&self, node: &Node) -> Result<Mounted, JsValue> {
        match node {
            Node::Text(text) => Ok(Mounted::Text(
                self.document.create_text_node(text.as_str()),
            )),
            Node::Element(element) => {
                let el = self.document.create_element(element.tag())?;
                let mut children = Vec::with_capacity(element.children().len());

                for child in element.children() {
                    let mounted = self.build(child)?;

                    el.append_child(mounted.node())?;
                    children.push(mounted);
                }

                let listener = match element.onclick() {
                    Some(listener) => Some(self.listen(&el, listener.eid())?),
                    None => None,
                };

                Ok(Mounted::Element {
                    el,
                    listener,
                    children,
                })
            }
        }
    }

    fn listen(&self, el: &web_sys::Element, eid: EventId) -> Result<Closure<dyn FnMut()>, JsValue> {
        let app = self.app;
        let closure = Closure::<dyn FnMut()>::new(move || dispatch(app, eid));

        el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;

        Ok(closure)
    }
}

enum Mounted {
    Text(web_sys::Text),
    Element {
        el: web_sys::Element,
        listener: Option<Closure<dyn FnMut()>>,
        children: Vec<Mounted>,
    },
}

impl Mounted {
    fn node(&self) -> &web_sys::Node {
        match self {
            Mounted::Text(text) => text.as_ref(),
            Mounted::Element { el, .. } => el.as_ref(),
        }
    }

    /// Bring this node in line with `node`, following a [`Patch`] made against
    /// the view it was built from.
    fn apply(
        &mut self,
        patch: &Patch,
        node: &Node,
        builder: &Builder,
        parent: &web_sys::Node,
    ) -> Result<(), JsValue> {
        let patched = match (patch, &mut *self, node) {
            (Patch::Keep, ..) => true,
            (Patch::Text, Mounted::Text(text), Node::Text(new)) => {
                text.set_data(new.as_str());
                true
            }
            (
                Patch::Element { listener, children },
                Mounted::Element {
                    el,
                    listener: bound,
                    children: mounted,
                },
                Node::Element(new),
            ) => {
                for ((patch, child), new) in children.iter().zip(mounted).zip(new.children()) {
                    child.apply(patch, new, builder, el.as_ref())?;
                }

                if let Some(rebind) = listener {
                    if let Some(old) = bound.take() {
                        el.remove_event_listener_with_callback(
                            "click",
                            old.as_ref().unchecked_ref(),
                        )?;
                    }

                    if let Rebind::Set(eid) = *rebind {
                        *bound = Some(builder.listen(el, eid)?);
                    }
                }

                true
            }
            _ => false,
        };

        if !patched {
            let fresh = builder.build(node)?;

            parent.replace_child(fresh.node(), self.node())?;
            *self = fresh;
        }

        Ok(())
    }
}

fn init_panic_hook() {
    // Only enable console hook on debug builds
    #[cfg(debug_assertions)]
    console_error_panic_hook::set_once();
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    struct Recorder {
        seen: Rc<Cell<Option<u32>>>,
        nested: Option<AppId>,
    }

    impl Driver for Recorder {
        fn trigger(&mut self, eid: EventId) -> Result<(), JsValue> {
            self.seen.set(Some(eid.get()));

            if let Some(app) = self.nested {
                dispatch(app, eid);
            }

            Ok(())
        }
    }

    fn register(nested: Option<AppId>) -> Rc<Cell<Option<u32>>> {
        let seen = Rc::new(Cell::new(None));
        let driver = Recorder {
            seen: seen.clone(),
            nested,
        };

        APPS.with_borrow_mut(|apps| apps.push(Box::new(driver)));

        seen
    }

    #[test]
    fn dispatch_reaches_its_app() {
        let first = register(None);
        let second = register(None);

        dispatch(AppId(1), EventId(3));

        assert_eq!(first.get(), None);
        assert_eq!(second.get(), Some(3));
    }

    #[test]
    fn unknown_app_is_ignored() {
        let only = register(None);

        dispatch(AppId(5), EventId(0));

        assert_eq!(only.get(), None);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "Cyclical update detected")]
    fn reentrant_dispatch_asserts() {
        register(Some(AppId(0)));

        dispatch(AppId(0), EventId(0));
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn reentrant_dispatch_is_dropped() {
        let seen = register(Some(AppId(0)));

        dispatch(AppId(0), EventId(2));

        assert_eq!(seen.get(), Some(2));
    }

    #[test]
    fn mount_errors_read_well() {
        assert_eq!(
            MountError::MissingTarget("app".into()).to_string(),
            "no element with id `app` to mount into"
        );
    }
}
