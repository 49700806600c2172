//! Virtual devices — a climate sensor per room and on/off switches.

mod room;
mod switch;

pub use room::VirtualRoom;
pub use switch::VirtualSwitch;
