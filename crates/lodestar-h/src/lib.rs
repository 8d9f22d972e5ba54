pub mod backend;
pub mod cdp;
mod eval;

pub use backend::HeadlessBackend;
