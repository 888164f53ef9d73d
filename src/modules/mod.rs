pub mod books;

use std::sync::Arc;

use bookstore_kernel::ModuleRegistry;
use sea_orm::DatabaseConnection;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, db: &DatabaseConnection) {
    let store = Arc::new(books::store::SeaOrmBookStore::new(db.clone()));
    registry.register(books::create_module(store));
}
