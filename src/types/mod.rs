//! Wire types exchanged with the simulator.

mod request;
pub use request::*;

mod response;
pub use response::*;

mod violation;
pub use violation::*;
