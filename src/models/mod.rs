pub mod clinic;
pub mod enums;
pub mod expense;
pub mod ids;
pub mod invoice;
pub mod ledger;
pub mod patient;
pub mod rule;
pub mod treatment;

pub use clinic::*;
pub use enums::*;
pub use expense::*;
pub use ids::*;
pub use invoice::*;
pub use ledger::*;
pub use patient::*;
pub use rule::*;
pub use treatment::*;
