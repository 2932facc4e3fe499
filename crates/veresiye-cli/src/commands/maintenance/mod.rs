//! Store upkeep: backups, restore and schema migrations.

mod backup;
mod migrate;
mod restore;

pub use backup::{handle_backup, handle_backups};
pub use migrate::handle_migrate;
pub use restore::handle_restore;
