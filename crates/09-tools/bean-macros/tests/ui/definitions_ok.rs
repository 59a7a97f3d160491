use bean_container::{ClassDef, Definition};
use bean_macros::bean_definitions;

#[derive(Default)]
struct Cache;

#[bean_definitions(scope = "ui::cache")]
fn cache_beans() -> Vec<Definition> {
    vec![ClassDef::builder::<Cache>().bean().default_constructor().build().into()]
}

fn main() {
    assert_eq!(cache_beans().len(), 1);
}
