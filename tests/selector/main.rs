//! Integration tests for the preset selector (store + filter + view sync).

mod support;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use preset_registry::{
    ColumnBinding, ColumnKind, IdCounterPolicy, PresetId, RawBitmap, SelectorConfig,
    SharedObject, SlotRole, SlotValue, View,
};
use support::{FakePipeline, Harness, Sighting, Witness};

#[test]
fn group_filter_hides_and_restores_rows() {
    let h = Harness::new();
    let a = h.selector.create();
    assert_eq!(a, PresetId::new(0));
    h.selector.set_slot(a, "group", "X");
    h.selector.set_slot(a, "comment", "hello");

    h.selector.set_constraint("group", Some("X"));
    assert!(h.selector.is_visible(a));
    h.idle();
    assert_eq!(h.view.borrow().row_count(), 1);
    assert_eq!(h.comment_cell(a).as_deref(), Some("hello"));

    h.selector.set_constraint("group", Some("Y"));
    assert_eq!(h.selector.count(), 1);
    assert_eq!(h.view.borrow().find_row_by_hidden_id(a), None);

    h.selector.set_constraint("group", None);
    assert!(h.view.borrow().find_row_by_hidden_id(a).is_some());
}

#[test]
fn writing_to_unknown_preset_is_harmless() {
    let h = Harness::new();
    let obj = SharedObject::new(5u8);

    assert!(!h.selector.set_slot(PresetId::new(5), "thumbnail", obj.clone()));
    assert_eq!(obj.strong_count(), 1);
    assert!(!h.selector.has_pending_sync());
    assert_eq!(h.idle(), 0);
    assert_eq!(h.view.borrow().row_count(), 0);
    assert!(!h.selector.delete_slot(PresetId::new(5), "thumbnail"));
    assert!(!h.selector.remove(PresetId::new(5)));
}

#[test]
fn burst_of_updates_coalesces_into_one_pass() {
    let h = Harness::new();
    let ids: Vec<_> = (0..4).map(|_| h.selector.create()).collect();
    for round in 0..5 {
        for id in &ids {
            h.selector.set_slot(*id, "comment", format!("r{}", round));
            h.selector.request_row_update(*id);
        }
    }

    assert_eq!(h.queue.pending(), 1);
    assert_eq!(h.idle(), 1);

    let stats = h.view.borrow().stats();
    assert_eq!(stats.inserts, 4);
    assert_eq!(stats.deletes, 0);
    for id in &ids {
        assert_eq!(h.comment_cell(*id).as_deref(), Some("r4"));
    }
    assert_eq!(h.queue.pending(), 0);
}

#[test]
fn second_pass_without_mutation_changes_nothing() {
    let h = Harness::new();
    let id = h.selector.create();
    h.selector.set_slot(id, "comment", "c");
    h.idle();
    h.view.borrow_mut().reset_stats();

    h.selector.request_row_update(id);
    h.idle();
    assert_eq!(h.view.borrow().stats().total(), 0);

    let report = h.selector.request_full_resync();
    assert!(report.is_noop());
    assert_eq!(h.view.borrow().stats().total(), 0);
}

#[test]
fn in_place_update_keeps_row_and_selection() {
    let h = Harness::new();
    let a = h.selector.create();
    let b = h.selector.create();
    h.idle();
    let row = h.view.borrow().find_row_by_hidden_id(b).unwrap();
    assert!(h.view.borrow_mut().select(b));

    h.selector.set_slot(b, "comment", "edited");
    h.idle();

    let view = h.view.borrow();
    assert_eq!(view.find_row_by_hidden_id(b), Some(row));
    assert_eq!(view.row_ids(), vec![a, b]);
    assert_eq!(view.selected_ids().into_iter().collect::<Vec<_>>(), vec![b]);
}

#[test]
fn remove_veto_keeps_preset() {
    let h = Harness::new();
    let keep = h.selector.create();
    let drop_me = h.selector.create();
    h.idle();

    let asked = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&asked);
    h.selector.on_remove(move |_, id| {
        log.borrow_mut().push(id);
        id != keep
    });

    assert!(!h.selector.remove(keep));
    assert!(h.selector.has(keep));
    assert!(h.selector.remove(drop_me));
    assert!(!h.selector.has(drop_me));
    assert_eq!(*asked.borrow(), vec![keep, drop_me]);

    h.idle();
    assert_eq!(h.view.borrow().row_ids(), vec![keep]);
}

#[test]
fn remove_selected_honours_veto_per_preset() {
    let h = Harness::new();
    let ids: Vec<_> = (0..3).map(|_| h.selector.create()).collect();
    h.idle();
    for id in &ids {
        h.view.borrow_mut().select(*id);
    }
    let protected = ids[1];
    h.selector.on_remove(move |_, id| id != protected);

    assert_eq!(h.selector.selected().len(), 3);
    assert_eq!(h.selector.remove_selected(), 2);
    h.idle();
    assert_eq!(h.view.borrow().row_ids(), vec![protected]);
}

#[test]
fn removal_releases_object_slots() {
    let h = Harness::new();
    let thumb = SharedObject::new(vec![1u8, 2, 3]);
    let id = h.selector.create();
    h.selector.set_role(id, SlotRole::Thumbnail, thumb.clone());
    h.idle();
    // Host, slot and the view's image cell.
    assert_eq!(thumb.strong_count(), 3);

    assert!(h.selector.remove(id));
    assert_eq!(thumb.strong_count(), 2);
    h.idle();
    assert_eq!(thumb.strong_count(), 1);
}

#[test]
fn finalizer_reads_selector_during_remove() {
    let h = Harness::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let a = h.selector.create();
    h.selector.create();
    h.selector.set_slot(a, "comment", "doomed");
    h.selector.set_slot(a, "screenshot", Witness::object(&h.selector, a, &seen));

    assert!(h.selector.remove(a));
    assert_eq!(
        *seen.borrow(),
        vec![Sighting {
            count: 2,
            present: true,
            slots: 0
        }]
    );
    assert_eq!(h.selector.count(), 1);
    assert!(!h.selector.has(a));
}

#[test]
fn finalizer_reads_selector_during_overwrite_and_delete() {
    let h = Harness::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let id = h.selector.create();

    h.selector.set_slot(id, "screenshot", Witness::object(&h.selector, id, &seen));
    assert!(h.selector.set_slot(id, "screenshot", "plain"));
    assert_eq!(h.selector.string_slot(id, "screenshot"), "plain");

    h.selector.set_slot(id, "screenshot", Witness::object(&h.selector, id, &seen));
    assert!(h.selector.delete_slot(id, "screenshot"));

    let released = Sighting {
        count: 1,
        present: true,
        slots: 0,
    };
    assert_eq!(*seen.borrow(), vec![released, released]);
}

#[test]
fn finalizers_read_selector_during_bulk_removal() {
    let h = Harness::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    for group in ["A", "A", "B"] {
        let id = h.selector.create();
        h.selector.set_role(id, SlotRole::Group, group);
        h.selector.set_slot(id, "screenshot", Witness::object(&h.selector, id, &seen));
    }

    assert_eq!(h.selector.remove_all_in_group("A"), 2);
    let in_group = Sighting {
        count: 3,
        present: true,
        slots: 0,
    };
    assert_eq!(*seen.borrow(), vec![in_group, in_group]);
    assert_eq!(h.selector.count(), 1);

    seen.borrow_mut().clear();
    assert_eq!(h.selector.remove_all(), 1);
    assert_eq!(
        *seen.borrow(),
        vec![Sighting {
            count: 1,
            present: true,
            slots: 0
        }]
    );
    assert_eq!(h.selector.count(), 0);
}

#[test]
fn remove_handler_may_remove_its_own_preset() {
    let h = Harness::new();
    let id = h.selector.create();
    h.idle();

    let asked = Rc::new(Cell::new(0));
    let calls = Rc::clone(&asked);
    h.selector.on_remove(move |selector, id| {
        calls.set(calls.get() + 1);
        assert!(selector.remove(id));
        true
    });

    assert!(h.selector.remove(id));
    assert_eq!(asked.get(), 1);
    assert!(!h.selector.has(id));
    h.idle();
    assert_eq!(h.view.borrow().row_count(), 0);

    let next = h.selector.create();
    assert!(h.selector.remove(next));
    assert_eq!(asked.get(), 2);
}

#[test]
fn group_bulk_operations() {
    let h = Harness::new();
    for group in ["A", "B", "A", "C"] {
        let id = h.selector.create();
        h.selector.set_role(id, SlotRole::Group, group);
    }
    h.idle();

    assert_eq!(h.selector.groups(), vec!["A", "B", "C"]);
    assert_eq!(h.selector.count_in_group("A"), 2);
    assert_eq!(h.selector.nth_in_group(1, "A"), Some(PresetId::new(2)));

    h.selector.set_group_filter(Some("A"));
    assert_eq!(h.view.borrow().row_count(), 2);

    assert_eq!(h.selector.remove_all_in_group("A"), 2);
    assert_eq!(h.view.borrow().row_count(), 0);
    assert_eq!(h.selector.count(), 2);

    h.selector.set_group_filter(None);
    assert_eq!(h.view.borrow().row_count(), 2);

    assert_eq!(h.selector.remove_all(), 2);
    assert_eq!(h.view.borrow().row_count(), 0);
    assert!(h.selector.create() > PresetId::new(3));
}

#[test]
fn reset_on_clear_policy_restarts_ids() {
    let h = Harness::with_config(SelectorConfig {
        id_policy: IdCounterPolicy::ResetOnClear,
        stamp_creation_time: false,
        ..SelectorConfig::default()
    });
    h.selector.create();
    h.selector.create();
    h.selector.remove_all();
    assert_eq!(h.selector.create(), PresetId::new(0));
}

#[test]
fn remapped_group_role() {
    let mut config = SelectorConfig {
        stamp_creation_time: false,
        ..SelectorConfig::default()
    };
    config.slot_names.set_name(SlotRole::Group, "bank");
    let h = Harness::with_config(config);

    let id = h.selector.create();
    h.selector.set_role(id, SlotRole::Group, "drums");
    assert_eq!(h.selector.string_slot(id, "bank"), "drums");
    assert_eq!(h.selector.role_string(id, SlotRole::Group), "drums");

    h.selector.set_group_filter(Some("drums"));
    h.idle();
    assert_eq!(h.view.borrow().row_count(), 1);
    h.selector.set_group_filter(Some("keys"));
    assert_eq!(h.view.borrow().row_count(), 0);
}

#[test]
fn regex_filter_and_malformed_pattern() {
    let h = Harness::new();
    let a = h.selector.create();
    let b = h.selector.create();
    h.selector.set_slot(a, "comment", "warm pad");
    h.selector.set_slot(b, "comment", "bright lead");
    h.idle();

    h.selector.set_constraint("comment", Some("pad$"));
    h.selector.set_constraint_mode("comment", true);
    assert_eq!(h.view.borrow().row_ids(), vec![a]);

    h.selector.set_constraint("comment", Some("(pad"));
    assert_eq!(h.view.borrow().row_count(), 0);
    assert!(h.selector.with_filter(|f| f.validate().is_err()));

    h.selector.clear_filter();
    assert_eq!(h.view.borrow().row_ids(), vec![a, b]);
}

#[test]
fn preset_becoming_visible_gets_a_row() {
    let h = Harness::new();
    h.selector.set_constraint("group", Some("X"));
    let id = h.selector.create();
    h.idle();
    assert_eq!(h.view.borrow().row_count(), 0);

    h.selector.set_slot(id, "group", "X");
    h.idle();
    assert_eq!(h.view.borrow().row_ids(), vec![id]);

    h.selector.set_slot(id, "group", "Z");
    h.idle();
    assert_eq!(h.view.borrow().row_count(), 0);
}

#[test]
fn shutdown_turns_armed_pass_into_noop() {
    let h = Harness::new();
    h.selector.create();
    assert_eq!(h.queue.pending(), 1);

    h.selector.shutdown();
    assert_eq!(h.idle(), 1);
    assert_eq!(h.view.borrow().stats().total(), 0);
    assert!(!h.selector.is_alive());

    h.selector.create();
    assert_eq!(h.queue.pending(), 0);
}

#[test]
fn dropped_selector_turns_armed_pass_into_noop() {
    let h = Harness::new();
    h.selector.create();
    let Harness {
        selector,
        view,
        queue,
    } = h;
    drop(selector);

    assert_eq!(queue.run_pending(), 1);
    assert_eq!(view.borrow().row_count(), 0);
}

#[test]
fn add_uses_handler_or_creates() {
    let h = Harness::new();
    h.selector.add();
    assert_eq!(h.selector.count(), 1);

    let calls = Rc::new(Cell::new(0));
    let seen = Rc::clone(&calls);
    h.selector.on_add(move |selector| {
        seen.set(seen.get() + 1);
        let id = selector.create();
        selector.set_slot(id, "comment", "from handler");
    });
    h.selector.add();
    assert_eq!(calls.get(), 1);
    assert_eq!(h.selector.count(), 2);

    h.idle();
    assert_eq!(h.comment_cell(PresetId::new(1)).as_deref(), Some("from handler"));
}

#[test]
fn apply_and_update_forward_known_ids() {
    let h = Harness::new();
    let id = h.selector.create();
    let applied = Rc::new(RefCell::new(Vec::new()));
    let updated = Rc::new(RefCell::new(Vec::new()));

    let log = Rc::clone(&applied);
    h.selector.on_apply(move |_, id| log.borrow_mut().push(id));
    let log = Rc::clone(&updated);
    h.selector.on_update(move |_, id| log.borrow_mut().push(id));

    assert!(h.selector.apply(id));
    assert!(h.selector.update(id));
    assert!(!h.selector.apply(PresetId::new(99)));
    assert!(!h.selector.update(PresetId::new(99)));
    assert_eq!(*applied.borrow(), vec![id]);
    assert_eq!(*updated.borrow(), vec![id]);
}

#[test]
fn cell_edits_write_slots_and_notify() {
    let mut config = SelectorConfig {
        stamp_creation_time: false,
        ..SelectorConfig::default()
    };
    config
        .columns
        .push(ColumnBinding::named("rating", 4, ColumnKind::Numeric).editable());
    let h = Harness::with_config(config);
    let id = h.selector.create();
    h.idle();

    let changed = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&changed);
    h.selector.on_preset_changed(move |_, id| log.borrow_mut().push(id));

    assert!(h.selector.edit_cell(id, 1, "renamed"));
    assert!(h.selector.edit_cell(id, 1, "renamed"));
    assert!(h.selector.edit_cell(id, 4, "3"));
    assert!(!h.selector.edit_cell(id, 4, "three"));
    assert!(!h.selector.edit_cell(id, 2, "123"));
    assert!(!h.selector.edit_cell(PresetId::new(42), 1, "x"));

    assert_eq!(h.selector.string_slot(id, "comment"), "renamed");
    assert_eq!(h.selector.slot(id, "rating"), Some(SlotValue::Int(3)));
    assert_eq!(*changed.borrow(), vec![id, id]);

    // Same number typed with a decimal point: the slot stays an Int, nothing changes.
    assert!(h.selector.edit_cell(id, 4, "3.0"));
    assert_eq!(h.selector.slot(id, "rating"), Some(SlotValue::Int(3)));
    assert_eq!(changed.borrow().len(), 2);

    h.idle();
    let view = h.view.borrow();
    let row = view.find_row_by_hidden_id(id).unwrap();
    assert_eq!(view.text(row, 1), Some("renamed"));
    assert_eq!(view.numeric(row, 4), Some(3.0));
}

#[test]
fn images_are_stored_as_object_slots() {
    let h = Harness::new();
    let id = h.selector.create();
    let pipeline = FakePipeline::default();

    let bitmap = RawBitmap::new(8, 4, vec![0; 8 * 4 * 4]);
    assert!(h.selector.set_images(id, &bitmap, &pipeline));
    assert!(!h.selector.set_images(PresetId::new(7), &bitmap, &pipeline));
    assert!(!h
        .selector
        .set_images(id, &RawBitmap::new(8, 4, vec![0; 3]), &pipeline));
    assert_eq!(pipeline.calls.get(), 1);

    let thumb = h.selector.object_slot(id, "thumbnail").unwrap();
    assert_eq!(thumb.downcast_ref::<(u32, u32)>(), Some(&(2, 1)));
    let shot = h.selector.object_slot(id, "screenshot").unwrap();
    assert_eq!(shot.downcast_ref::<(u32, u32)>(), Some(&(8, 4)));

    h.idle();
    let view = h.view.borrow();
    let row = view.find_row_by_hidden_id(id).unwrap();
    assert!(matches!(
        view.cell(row, 3),
        Some(preset_registry::CellValue::Image(Some(image))) if image.ptr_eq(&thumb)
    ));
}

#[test]
fn snapshot_restore_populates_view() {
    let source = Harness::new();
    for comment in ["one", "two"] {
        let id = source.selector.create();
        source.selector.set_slot(id, "comment", comment);
    }
    let snapshot = source.selector.snapshot();

    let target = Harness::new();
    target.selector.create();
    let ids = target.selector.restore(snapshot);
    assert_eq!(ids, vec![PresetId::new(1), PresetId::new(2)]);
    assert_eq!(target.view.borrow().row_count(), 3);
    assert_eq!(target.comment_cell(ids[1]).as_deref(), Some("two"));
}
