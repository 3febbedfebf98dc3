pub mod directory;
pub mod grants;
