pub mod module;
pub mod registry;
pub mod settings;

pub use module::{Endpoint, InitCtx, Module};
pub use registry::ModuleRegistry;
