// External I/O operations module
pub mod lock; // Lock file operations
pub mod signals; // Unix signal handling
