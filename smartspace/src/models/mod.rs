pub mod device;
pub mod profile;
pub mod routine;
pub mod session;

pub use device::{Device, DeviceId, DeviceKind, DevicePatch, DeviceStatus, NewDevice, Telemetry};
pub use profile::ProfileId;
pub use routine::{
    NewRoutine, Priority, Routine, RoutineDraft, RoutineId, RoutineKind, RoutinePatch, Schedule,
};
pub use session::{Session, SessionEvent, SessionEventKind, User};
