mod device_id;
mod module_id;

pub use device_id::{DeviceId, DeviceIdParseError};
pub use module_id::ModuleId;
