pub mod enums;
pub mod message;
pub mod patient;
pub mod session;
pub mod stage;

pub use enums::*;
pub use message::*;
pub use patient::*;
pub use session::*;
pub use stage::*;
