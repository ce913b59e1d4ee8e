pub mod enums;
pub mod medicine;
pub mod user;
pub mod visit;

pub use enums::*;
pub use medicine::*;
pub use user::*;
pub use visit::*;
