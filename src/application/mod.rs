// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer turns a document into highlights by coordinating
// the other layers.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No UI or printing here (that's Layer 1)
//   - No direct file access beyond loading its own config
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The highlight extraction workflow and its configuration
pub mod extract_use_case;

// Per-chunk predictions → one document table
pub mod aggregator;

// Document table → highlight sentences
pub mod selector;
