pub mod books;

use biblio_db::{DbModule, SharedStore};
use biblio_kernel::ModuleRegistry;

/// Register the store lifecycle and every catalog module with the registry
pub fn register_all(registry: &mut ModuleRegistry, store: SharedStore) {
    registry.register_core(DbModule::new(store.clone()).into_module());
    registry.register_custom(books::create_module(store));
}
