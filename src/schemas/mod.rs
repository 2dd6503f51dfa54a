// Data structures (schemas) shared across the crate.

// Registry releases, both raw (as cached) and normalized.
pub mod release;
// Toolchain products found on the host and the persisted selection.
pub mod toolchain;
// Static tool descriptors and the post-install hook contract.
pub mod tools;
