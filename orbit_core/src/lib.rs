pub mod bridge;
pub mod device;
pub mod orchestrator;
pub mod store;
pub mod triggers;
pub mod visual;
pub mod window;

// Re-exports
pub use bridge::{ConnectionState, DeviceSyncBridge};
pub use device::{DeviceHandle, LoopbackDevice};
pub use orchestrator::Orchestrator;
pub use visual::{VisualEvent, PULSE_DECAY_PER_SEC};
pub use window::WindowState;

#[cfg(test)]
mod tests_sync;
