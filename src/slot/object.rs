use std::any::Any;
use std::fmt;
use std::rc::{Rc, Weak};

/// Shared, reference-counted external object stored in an `Object` slot.
///
/// Cloning acquires a strong reference and dropping releases it, so every slot
/// holding the object is one co-owner among whatever the host keeps elsewhere.
#[derive(Clone)]
pub struct SharedObject {
    inner: Rc<dyn Any>,
}

impl SharedObject {
    pub fn new<T: Any>(value: T) -> Self {
        SharedObject {
            inner: Rc::new(value),
        }
    }

    /// Wrap an object the host already shares.
    pub fn from_rc(inner: Rc<dyn Any>) -> Self {
        SharedObject { inner }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Number of live holders, slots included.
    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    pub fn ptr_eq(&self, other: &SharedObject) -> bool {
        Rc::as_ptr(&self.inner) as *const () == Rc::as_ptr(&other.inner) as *const ()
    }

    pub fn as_rc(&self) -> &Rc<dyn Any> {
        &self.inner
    }

    /// A reference that does not keep the object alive.
    pub(crate) fn downgrade(&self) -> Weak<dyn Any> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn is(&self, weak: &Weak<dyn Any>) -> bool {
        Rc::as_ptr(&self.inner) as *const () == weak.as_ptr() as *const ()
    }
}

impl fmt::Debug for SharedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedObject")
            .field("ptr", &(Rc::as_ptr(&self.inner) as *const ()))
            .field("strong", &self.strong_count())
            .finish()
    }
}

/// Opaque untyped handle. The registry stores and compares it, nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExternalHandle(usize);

impl ExternalHandle {
    pub fn new(addr: usize) -> Self {
        ExternalHandle(addr)
    }

    pub fn from_ptr<T>(ptr: *const T) -> Self {
        ExternalHandle(ptr as usize)
    }

    pub fn addr(&self) -> usize {
        self.0
    }

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}
