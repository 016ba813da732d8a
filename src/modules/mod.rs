pub mod book;

use bookshelf_kernel::ModuleRegistry;
use sea_orm::DatabaseConnection;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, db: &DatabaseConnection) {
    registry.register(book::create_module(db.clone()));
}
