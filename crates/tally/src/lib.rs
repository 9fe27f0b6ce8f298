// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Tally
//!
//! _Tiny stateful components for the web._
//!
//! A component in **Tally** is a plain Rust type that owns its state, plus a pure
//! [`render`](Component::render) function that describes what the state looks like.
//! There is no base class to inherit from and no `this` to bind: event handlers are
//! closures that receive the component as `&mut Self` when they fire.
//!
//! ### Example
//!
//! ```
//! use tally::prelude::*;
//!
//! struct Clicks {
//!     clicks: u32,
//! }
//!
//! impl Component for Clicks {
//!     fn render(&self, ctx: &mut Ctx<Self>) -> Node {
//!         let onclick = ctx.bind(|this: &mut Clicks| this.clicks += 1);
//!
//!         Element::new("p")
//!             .child("Clicked ")
//!             .child(self.clicks)
//!             .child(" times ")
//!             .child(Element::new("button").on_click(onclick).child("Click"))
//!             .into()
//!     }
//! }
//!
//! let mut runtime = Runtime::new(Clicks { clicks: 0 });
//! let (_, button) = runtime.view().controls()[0].clone();
//!
//! runtime.trigger(button.eid());
//!
//! assert_eq!(runtime.view().summary(), "Clicked 1 times [Click]");
//! ```
//!
//! In the browser a component is mounted into an existing element with the
//! [`start!`](start) macro, which generates the Wasm entry point:
//!
//! ```no_run
//! # use tally::prelude::*;
//! # struct App;
//! # impl Component for App {
//! #     fn render(&self, _: &mut Ctx<Self>) -> Node { "Hello".into() }
//! # }
//! // Mount `App` into `<div id="app"></div>`
//! tally::start!(|| App, "app");
//! # fn main() {}
//! ```

#[cfg(all(
    target_arch = "wasm32",
    feature = "rlsf",
    not(target_feature = "atomics")
))]
#[global_allocator]
static A: rlsf::SmallGlobalTlsf = rlsf::SmallGlobalTlsf::new();

mod diff;
pub mod dom;
pub mod runtime;
pub mod view;

use runtime::Ctx;
use view::Node;

/// The prelude module with most commonly used types.
///
/// Intended use is:
/// ```
/// use tally::prelude::*;
/// ```
pub mod prelude {
    pub use crate::runtime::{Ctx, EventId, Listener, Runtime, ShouldRender, Then};
    pub use crate::view::{Element, Node, Text};
    pub use crate::Component;
}

/// Crate re-exports for the [`start!`](start) macro internals
pub mod reexport {
    pub use wasm_bindgen;
    pub use web_sys;
}

/// Types that hold state and can describe it as a [`Node`] tree.
pub trait Component: Sized + 'static {
    /// Describe the current state. This must not mutate anything; handlers
    /// that need to change state are registered with [`Ctx::bind`] and run
    /// later, when their event fires.
    fn render(&self, ctx: &mut Ctx<Self>) -> Node;
}

/// Generate the Wasm start function that mounts a component into the element
/// with the given id. Mount errors are thrown to JavaScript.
#[macro_export]
macro_rules! start {
    ($construct:expr, $target:expr) => {
        use wasm_bindgen::prelude::wasm_bindgen;
        use $crate::reexport::wasm_bindgen;

        #[wasm_bindgen(start)]
        fn tally_main() -> Result<(), wasm_bindgen::JsValue> {
            $crate::dom::start($target, $construct)
                .map(drop)
                .map_err(Into::into)
        }
    };
}
