pub mod models;
pub mod enums;
pub mod session_context;

pub use models::*;
pub use enums::*;
pub use session_context::*;
