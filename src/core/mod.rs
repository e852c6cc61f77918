pub mod models;
pub mod logging;

// Load → merge → derive pipeline
pub mod loader;
pub mod merger;
pub mod derive;
pub mod state;

// Output surfaces
pub mod render;
pub mod navigate;
pub mod debounce;

// Chrome export import
pub mod convert;
