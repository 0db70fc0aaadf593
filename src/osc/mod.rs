pub mod coerce;
pub mod dispatcher;
pub mod message;
pub mod pattern;
pub mod registry;
pub mod types;


pub use coerce::Coercion;
pub use dispatcher::{DispatchOutcome, Dispatcher, MethodCall, Verdict};
pub use message::{Message, decode_packet};
pub use pattern::Pattern;
pub use registry::{MethodId, Registration, Registry};
