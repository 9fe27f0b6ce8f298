// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tally::prelude::*;

/// Counts clicks on its button.
#[derive(Debug, Default)]
pub struct Counter {
    count: u64,
}

impl Counter {
    pub const fn new() -> Self {
        Counter { count: 0 }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn increment(&mut self) {
        self.count += 1;
    }
}

impl Component for Counter {
    fn render(&self, ctx: &mut Ctx<Self>) -> Node {
        let increment = ctx.bind(Counter::increment);

        Element::new("div")
            .child(self.count)
            .child(" ")
            .child(
                Element::new("button")
                    .on_click(increment)
                    .child("Increment Me"),
            )
            .into()
    }
}

tally::start!(Counter::new, "app");

#[cfg(test)]
mod tests {
    use super::*;

    fn click(runtime: &mut Runtime<Counter>) {
        let controls = runtime.view().controls();

        assert_eq!(controls.len(), 1);

        let (label, button) = &controls[0];

        assert_eq!(label, "Increment Me");
        assert_eq!(runtime.trigger(button.eid()), Some(Then::Render));
    }

    #[test]
    fn starts_at_zero() {
        let runtime = Runtime::new(Counter::new());

        assert_eq!(runtime.component().count(), 0);
        assert!(runtime.view().text_content().contains('0'));
        assert_eq!(runtime.view().summary(), "0 [Increment Me]");
        assert_eq!(runtime.view().controls().len(), 1);
    }

    #[test]
    fn one_click() {
        let mut runtime = Runtime::new(Counter::new());

        click(&mut runtime);

        assert_eq!(runtime.component().count(), 1);
        assert_eq!(runtime.view().summary(), "1 [Increment Me]");
    }

    #[test]
    fn n_clicks() {
        for n in [0, 1, 2, 9, 10, 99, 137] {
            let mut runtime = Runtime::new(Counter::new());

            for _ in 0..n {
                click(&mut runtime);
            }

            assert_eq!(runtime.component().count(), n);
            assert_eq!(runtime.view().summary(), format!("{n} [Increment Me]"));
        }
    }

    #[test]
    fn render_is_pure() {
        let mut counter = Counter::new();
        counter.increment();
        counter.increment();

        let first = counter.render(&mut Ctx::new());
        let second = counter.render(&mut Ctx::new());

        assert_eq!(first, second);
        assert_eq!(counter.count(), 2);

        let mut runtime = Runtime::new(counter);
        let before = runtime.view().clone();

        runtime.render();
        runtime.render();

        assert_eq!(runtime.view(), &before);
    }

    #[test]
    fn count_only_grows_by_one() {
        let mut runtime = Runtime::new(Counter::new());
        let mut last = runtime.component().count();

        for _ in 0..20 {
            runtime.render();
            assert_eq!(runtime.component().count(), last);

            click(&mut runtime);

            let count = runtime.component().count();
            assert_eq!(count, last + 1);
            last = count;
        }
    }

    #[test]
    fn instances_are_isolated() {
        let mut a = Runtime::new(Counter::new());
        let b = Runtime::new(Counter::new());

        click(&mut a);
        click(&mut a);

        assert_eq!(a.component().count(), 2);
        assert_eq!(b.component().count(), 0);
        assert_eq!(b.view().summary(), "0 [Increment Me]");
    }

    #[test]
    fn click_through() {
        let mut runtime = Runtime::new(Counter::new());
        assert_eq!(runtime.view().summary(), "0 [Increment Me]");

        click(&mut runtime);
        assert_eq!(runtime.view().summary(), "1 [Increment Me]");

        click(&mut runtime);
        click(&mut runtime);
        assert_eq!(runtime.view().summary(), "3 [Increment Me]");
    }

    #[test]
    fn renders_html() {
        let runtime = Runtime::new(Counter::new());

        assert_eq!(
            runtime.view().to_string(),
            "<div>0 <button>Increment Me</button></div>"
        );
    }

    #[test]
    fn increment_without_runtime() {
        let mut counter = Counter::default();

        counter.increment();

        assert_eq!(counter.count(), 1);
    }
}
