use orbit_shared::{ListenerId, Target};

struct Listener {
    id: ListenerId,
    target: Target,
    callback: Box<dyn FnMut(usize)>,
}

/// Registry of per-target trigger listeners (the visualization layer's
/// hook into device-origin step firings).
///
/// Listeners receive the window-relative index exactly as the device
/// supplied it, not a re-derived one.
#[derive(Default)]
pub struct TriggerRouter {
    listeners: Vec<Listener>,
}

impl TriggerRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        target: Target,
        callback: impl FnMut(usize) + 'static,
    ) -> ListenerId {
        let id = ListenerId::new();
        self.listeners.push(Listener {
            id,
            target,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove a listener. Returns false if the id is not registered
    /// (e.g. already unregistered).
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    pub fn dispatch(&mut self, target: Target, relative_index: usize) {
        for listener in &mut self.listeners {
            if listener.target == target {
                (listener.callback)(relative_index);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
