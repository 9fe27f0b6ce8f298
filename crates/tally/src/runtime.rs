// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Component runtime
//!
//! [`Runtime`] owns a single component instance together with its latest rendered
//! view and the handlers that view bound. Events are delivered by [`EventId`], each
//! one runs to completion, and when the handler asks for it the component is
//! rendered again before [`trigger`](Runtime::trigger) returns.

use crate::view::Node;
use crate::Component;

/// Describes whether or not a component should be rendered after state changes.
/// For uses see:
///
/// * [`Ctx::bind`](Ctx::bind)
pub trait ShouldRender: 'static {
    fn should_render(self) -> bool;

    fn then(self) -> Then;
}

/// Closures without return type always update their view.
impl ShouldRender for () {
    fn should_render(self) -> bool {
        true
    }

    fn then(self) -> Then {
        Then::Render
    }
}

/// An enum that implements the [`ShouldRender`](ShouldRender) trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Then {
    /// This is a silent update
    Stop,
    /// Render the view after this update
    Render,
}

impl ShouldRender for Then {
    fn should_render(self) -> bool {
        match self {
            Then::Stop => false,
            Then::Render => true,
        }
    }

    fn then(self) -> Then {
        self
    }
}

/// Slot of a handler within a single render. Ids are handed out in the order
/// [`Ctx::bind`] is called, starting from zero on every render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct EventId(pub(crate) u32);

impl EventId {
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Handle to a bound handler, attached to elements with
/// [`Element::on_click`](crate::view::Element::on_click).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listener(EventId);

impl Listener {
    pub const fn eid(self) -> EventId {
        self.0
    }
}

type Handler<C> = Box<dyn Fn(&mut C) -> Then>;

/// Collects the handlers bound during one render of a component `C`.
pub struct Ctx<C> {
    handlers: Vec<Handler<C>>,
}

impl<C> Ctx<C> {
    pub const fn new() -> Self {
        Ctx {
            handlers: Vec::new(),
        }
    }

    /// Bind a handler to the component. The handler gets the component instance
    /// that rendered it, whenever the returned [`Listener`] fires.
    ///
    /// ```
    /// use tally::prelude::*;
    ///
    /// struct Limited(u8);
    ///
    /// let mut ctx = Ctx::<Limited>::new();
    ///
    /// // always renders
    /// let reset = ctx.bind(|this: &mut Limited| this.0 = 0);
    ///
    /// // only renders on change
    /// let bump = ctx.bind(|this: &mut Limited| {
    ///     if this.0 < 10 {
    ///         this.0 += 1;
    ///         Then::Render
    ///     } else {
    ///         Then::Stop
    ///     }
    /// });
    ///
    /// assert_ne!(reset, bump);
    /// ```
    pub fn bind<F, O>(&mut self, handler: F) -> Listener
    where
        C: 'static,
        F: Fn(&mut C) -> O + 'static,
        O: ShouldRender,
    {
        let eid = EventId(self.handlers.len() as u32);

        self.handlers.push(Box::new(move |component| handler(component).then()));

        Listener(eid)
    }
}

/// A mounted component instance.
pub struct Runtime<C> {
    component: C,
    view: Node,
    handlers: Vec<Handler<C>>,
}

impl<C> Runtime<C>
where
    C: Component,
{
    /// Take ownership of the component and render it for the first time.
    pub fn new(component: C) -> Self {
        let mut ctx = Ctx::new();
        let view = component.render(&mut ctx);

        Runtime {
            component,
            view,
            handlers: ctx.handlers,
        }
    }

    pub fn component(&self) -> &C {
        &self.component
    }

    /// The view produced by the latest render.
    pub fn view(&self) -> &Node {
        &self.view
    }

    /// Run the handler bound to `eid` and re-render if it asks for it.
    ///
    /// Returns `None` without touching the component if nothing is bound to `eid`.
    pub fn trigger(&mut self, eid: EventId) -> Option<Then> {
        let handler = self.handlers.get(eid.0 as usize)?;
        let then = handler(&mut self.component);

        if then.should_render() {
            self.render();
        }

        Some(then)
    }

    /// Render the component again, replacing the view and all bound handlers.
    pub fn render(&mut self) {
        let mut ctx = Ctx::new();

        self.view = self.component.render(&mut ctx);
        self.handlers = ctx.handlers;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Element;

    struct Toggle {
        on: bool,
        renders: u32,
        silent: u32,
    }

    impl Toggle {
        fn new() -> Self {
            Toggle {
                on: false,
                renders: 0,
                silent: 0,
            }
        }
    }

    impl Component for Toggle {
        fn render(&self, ctx: &mut Ctx<Self>) -> Node {
            let flip = ctx.bind(|this: &mut Toggle| {
                this.on = !this.on;
                this.renders += 1;
            });
            let poke = ctx.bind(|this: &mut Toggle| {
                this.silent += 1;
                Then::Stop
            });

            Element::new("div")
                .child(if self.on { "on" } else { "off" })
                .child(Element::new("button").on_click(flip).child("Flip"))
                .child(Element::new("button").on_click(poke).child("Poke"))
                .into()
        }
    }

    fn control(runtime: &Runtime<Toggle>, label: &str) -> EventId {
        runtime
            .view()
            .controls()
            .into_iter()
            .find(|(l, _)| l == label)
            .map(|(_, listener)| listener.eid())
            .expect("control exists")
    }

    #[test]
    fn ids_follow_bind_order() {
        let runtime = Runtime::new(Toggle::new());

        assert_eq!(control(&runtime, "Flip").get(), 0);
        assert_eq!(control(&runtime, "Poke").get(), 1);
    }

    #[test]
    fn render_after_update() {
        let mut runtime = Runtime::new(Toggle::new());
        let flip = control(&runtime, "Flip");

        assert_eq!(runtime.trigger(flip), Some(Then::Render));
        assert_eq!(runtime.view().summary(), "on[Flip][Poke]");
        assert_eq!(runtime.component().renders, 1);
    }

    #[test]
    fn silent_update_keeps_view() {
        let mut runtime = Runtime::new(Toggle::new());
        let before = runtime.view().clone();
        let poke = control(&runtime, "Poke");

        assert_eq!(runtime.trigger(poke), Some(Then::Stop));
        assert_eq!(runtime.component().silent, 1);
        assert_eq!(runtime.view(), &before);
    }

    #[test]
    fn unknown_event_is_ignored() {
        let mut runtime = Runtime::new(Toggle::new());

        assert_eq!(runtime.trigger(EventId(7)), None);
        assert!(!runtime.component().on);
        assert_eq!(runtime.component().silent, 0);
    }

    #[test]
    fn ids_are_stable_across_renders() {
        let mut runtime = Runtime::new(Toggle::new());
        let flip = control(&runtime, "Flip");

        runtime.trigger(flip);
        runtime.trigger(flip);

        assert_eq!(control(&runtime, "Flip"), flip);
        assert_eq!(runtime.view().summary(), "off[Flip][Poke]");
    }
}
