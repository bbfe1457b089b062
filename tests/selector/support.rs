//! Shared fixtures for selector integration tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use preset_registry::{
    IdleQueue, ImagePipeline, InMemoryView, PresetId, PresetImages, PresetSelector, RawBitmap,
    SelectorConfig, SharedObject,
};

pub struct Harness {
    pub selector: PresetSelector,
    pub view: Rc<RefCell<InMemoryView>>,
    pub queue: IdleQueue,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(SelectorConfig {
            stamp_creation_time: false,
            ..SelectorConfig::default()
        })
    }

    pub fn with_config(config: SelectorConfig) -> Self {
        let view = Rc::new(RefCell::new(InMemoryView::new(config.id_column)));
        let queue = IdleQueue::new();
        let selector = PresetSelector::new(config, view.clone(), Rc::new(queue.clone()))
            .expect("valid config");
        Harness {
            selector,
            view,
            queue,
        }
    }

    /// Run one event-loop iteration.
    pub fn idle(&self) -> usize {
        self.queue.run_pending()
    }

    pub fn comment_cell(&self, id: PresetId) -> Option<String> {
        use preset_registry::View;
        let view = self.view.borrow();
        let row = view.find_row_by_hidden_id(id)?;
        view.text(row, 1).map(str::to_string)
    }
}

/// Image pipeline that wraps the capture dimensions and counts calls.
#[derive(Default)]
pub struct FakePipeline {
    pub calls: Cell<usize>,
}

impl ImagePipeline for FakePipeline {
    fn render(&self, bitmap: &RawBitmap) -> Option<PresetImages> {
        self.calls.set(self.calls.get() + 1);
        Some(PresetImages {
            thumbnail: SharedObject::new((bitmap.width / 4, bitmap.height / 4)),
            screenshot: SharedObject::new((bitmap.width, bitmap.height)),
        })
    }
}

/// What a finalizer saw of the selector while its object was being released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sighting {
    pub count: usize,
    pub present: bool,
    pub slots: usize,
}

/// Slot object that reads the selector from its finalizer.
pub struct Witness {
    selector: PresetSelector,
    id: PresetId,
    seen: Rc<RefCell<Vec<Sighting>>>,
}

impl Witness {
    pub fn object(
        selector: &PresetSelector,
        id: PresetId,
        seen: &Rc<RefCell<Vec<Sighting>>>,
    ) -> SharedObject {
        SharedObject::new(Witness {
            selector: selector.clone(),
            id,
            seen: Rc::clone(seen),
        })
    }
}

impl Drop for Witness {
    fn drop(&mut self) {
        let id = self.id;
        let slots = self
            .selector
            .with_store(|store| store.get(id).map_or(0, |preset| preset.slot_count()));
        self.seen.borrow_mut().push(Sighting {
            count: self.selector.count(),
            present: self.selector.has(id),
            slots,
        });
    }
}
