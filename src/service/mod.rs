//! The PiCom service: one event loop owning talk control, audio, hardware and
//! the voice session, driven through a cloneable `ServiceHandle`.

mod command;
mod picom;
mod status;

pub use command::{ServiceCommand, ServiceHandle};
pub use picom::{PiComService, ServiceOptions};
pub use status::{ConnectOutcome, ServiceStatus};
