pub mod device;
pub mod routine;

pub use device::DeviceRegistry;
pub use routine::RoutineRegistry;
