//! Host handlers for the selector's command surface.

use std::rc::Rc;

use super::PresetSelector;
use crate::preset::PresetId;

pub type AddHandler = Rc<dyn Fn(&PresetSelector)>;
pub type PresetHandler = Rc<dyn Fn(&PresetSelector, PresetId)>;
/// Returning `false` vetoes the removal.
pub type RemoveHandler = Rc<dyn Fn(&PresetSelector, PresetId) -> bool>;

/// Handlers captured at registration time. Each receives the selector so it can
/// act on it without holding its own handle.
#[derive(Clone, Default)]
pub(crate) struct Hooks {
    pub(crate) on_add: Option<AddHandler>,
    pub(crate) on_apply: Option<PresetHandler>,
    pub(crate) on_update: Option<PresetHandler>,
    pub(crate) on_remove: Option<RemoveHandler>,
    pub(crate) on_preset_changed: Option<PresetHandler>,
}

impl PresetSelector {
    /// Handler for the "add" gesture. Without one, `add` creates an empty preset.
    pub fn on_add(&self, handler: impl Fn(&PresetSelector) + 'static) {
        self.hooks.borrow_mut().on_add = Some(Rc::new(handler));
    }

    pub fn on_apply(&self, handler: impl Fn(&PresetSelector, PresetId) + 'static) {
        self.hooks.borrow_mut().on_apply = Some(Rc::new(handler));
    }

    pub fn on_update(&self, handler: impl Fn(&PresetSelector, PresetId) + 'static) {
        self.hooks.borrow_mut().on_update = Some(Rc::new(handler));
    }

    /// Asked before every single-preset removal; `false` keeps the preset.
    pub fn on_remove(&self, handler: impl Fn(&PresetSelector, PresetId) -> bool + 'static) {
        self.hooks.borrow_mut().on_remove = Some(Rc::new(handler));
    }

    /// Fired after a user cell edit changed a preset.
    pub fn on_preset_changed(&self, handler: impl Fn(&PresetSelector, PresetId) + 'static) {
        self.hooks.borrow_mut().on_preset_changed = Some(Rc::new(handler));
    }

    // Handlers are cloned out before being called so they may re-enter the selector.

    pub(crate) fn fire_add(&self) -> bool {
        let handler = self.hooks.borrow().on_add.clone();
        match handler {
            Some(handler) => {
                handler(self);
                true
            }
            None => false,
        }
    }

    pub(crate) fn fire_apply(&self, id: PresetId) {
        let handler = self.hooks.borrow().on_apply.clone();
        if let Some(handler) = handler {
            handler(self, id);
        }
    }

    pub(crate) fn fire_update(&self, id: PresetId) {
        let handler = self.hooks.borrow().on_update.clone();
        if let Some(handler) = handler {
            handler(self, id);
        }
    }

    /// True when the removal may go ahead.
    pub(crate) fn ask_remove(&self, id: PresetId) -> bool {
        let handler = self.hooks.borrow().on_remove.clone();
        match handler {
            Some(handler) => handler(self, id),
            None => true,
        }
    }

    pub(crate) fn fire_preset_changed(&self, id: PresetId) {
        let handler = self.hooks.borrow().on_preset_changed.clone();
        if let Some(handler) = handler {
            handler(self, id);
        }
    }
}
