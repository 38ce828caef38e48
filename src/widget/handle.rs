use crate::engine::WidgetInstance;

/// Sole owner of one live external widget.
///
/// The instance is removed exactly once: through [`release`](Self::release)
/// or, on any other exit path, when the handle is dropped.
pub struct WidgetHandle<W: WidgetInstance> {
    instance: Option<W>,
    generation: u64,
}

impl<W: WidgetInstance> WidgetHandle<W> {
    pub fn new(instance: W, generation: u64) -> Self {
        Self {
            instance: Some(instance),
            generation,
        }
    }

    /// Mount generation this widget was built for
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Remove the external widget now
    pub fn release(mut self) {
        self.remove_instance();
    }

    fn remove_instance(&mut self) {
        if let Some(instance) = self.instance.take() {
            instance.remove();
            tracing::debug!(generation = self.generation, "Widget instance removed");
        }
    }
}

impl<W: WidgetInstance> Drop for WidgetHandle<W> {
    fn drop(&mut self) {
        self.remove_instance();
    }
}
