//! Drives a selector against the headless view, printing the table after each loop iteration.
//!
//! Run with `RUST_LOG=preset_registry=debug` to watch the deferred passes.

use std::cell::RefCell;
use std::rc::Rc;

use preset_registry::{
    IdleQueue, InMemoryView, PresetSelector, SelectorConfig, SlotRole, View,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn print_table(label: &str, view: &InMemoryView) {
    println!("-- {} ({} rows)", label, view.row_count());
    for row in view.rows() {
        println!(
            "   id={:<3} comment={:?}",
            view.text(row, 0).unwrap_or("?"),
            view.text(row, 1).unwrap_or("")
        );
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let view = Rc::new(RefCell::new(InMemoryView::new(0)));
    let queue = IdleQueue::new();
    let selector = match PresetSelector::new(
        SelectorConfig::default(),
        view.clone(),
        Rc::new(queue.clone()),
    ) {
        Ok(selector) => selector,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };

    selector.on_remove(|selector, id| {
        let keep = selector.role_string(id, SlotRole::Comment) == "factory";
        if keep {
            println!("   refusing to remove factory preset {}", id);
        }
        !keep
    });

    for (group, comment) in [("pads", "warm"), ("pads", "factory"), ("leads", "bright")] {
        let id = selector.create();
        selector.set_role(id, SlotRole::Group, group);
        selector.set_role(id, SlotRole::Comment, comment);
    }
    queue.run_pending();
    print_table("after creation", &view.borrow());

    selector.set_group_filter(Some("pads"));
    print_table("group = pads", &view.borrow());

    let visible = view.borrow().row_ids();
    for id in visible {
        selector.remove(id);
    }
    queue.run_pending();
    print_table("after removing pads", &view.borrow());

    selector.set_group_filter(None);
    print_table("all groups", &view.borrow());

    match selector.snapshot().to_json() {
        Ok(json) => println!("snapshot: {}", json),
        Err(e) => eprintln!("{}", e),
    }
}
