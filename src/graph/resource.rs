//! The opaque resource handle flowing along connections.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque handle to a rendering resource, typically a view of a GPU image or surface region.
///
/// This is the payload type of every connection in a job. The scheduler moves these from
/// producer output slots to consumer input slots without ever interpreting the contents;
/// only the collaborator that created the view knows what is inside. Cloning is cheap, the
/// underlying value is shared.
#[derive(Clone)]
pub struct ResourceView {
    name: Arc<str>,
    handle: Arc<dyn Any + Send + Sync>,
}

impl ResourceView {
    /// Wrap a resource handle, with a name used purely for diagnostics.
    pub fn new<T: Any + Send + Sync>(name: impl Into<String>, handle: T) -> Self {
        ResourceView {
            name: name.into().into(),
            handle: Arc::new(handle),
        }
    }

    /// Get the diagnostic name of this view.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the wrapped handle back, if `T` is the type it was created with.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.handle.downcast_ref::<T>()
    }

    /// Returns true if two views refer to the same underlying resource.
    pub fn same_resource(&self, other: &ResourceView) -> bool {
        Arc::ptr_eq(&self.handle, &other.handle)
    }
}

impl fmt::Debug for ResourceView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResourceView").field(&self.name).finish()
    }
}
