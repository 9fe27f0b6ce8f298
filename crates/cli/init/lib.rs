use tally::prelude::*;

#[derive(Default)]
struct App {
    count: u64,
}

impl Component for App {
    fn render(&self, ctx: &mut Ctx<Self>) -> Node {
        let increment = ctx.bind(|app: &mut App| app.count += 1);

        Element::new("div")
            .child(self.count)
            .child(" ")
            .child(Element::new("button").on_click(increment).child("Increment Me"))
            .into()
    }
}

tally::start!(App::default, "app");
