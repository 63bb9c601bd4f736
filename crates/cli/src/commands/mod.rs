pub mod cache;
pub mod patch;
pub mod project;
pub mod saves;
pub mod targets;
pub mod tools;
pub mod util;

pub use cache::*;
pub use patch::*;
pub use project::*;
pub use saves::*;
pub use targets::*;
pub use tools::*;
pub use util::*;
