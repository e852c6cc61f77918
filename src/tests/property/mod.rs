//! Property-based tests for bmview
//!
//! Property tests verify invariants that should hold for all inputs, rather
//! than testing specific cases.
//!
//! ## Test Modules
//!
//! - `derive_props`: the filter/sort engine
//!   - Output only contains items from the source collection
//!   - Every matching item appears exactly once
//!   - Deriving twice with the same inputs changes nothing
//!   - Title descending is the exact reverse of title ascending
//!
//! - `render_props`: HTML escaping and highlighting
//!   - Escaped text contains no markup-significant characters
//!   - Highlighting only adds `<mark>` tags
//!
//! ## Configuration
//!
//! By default, proptest runs 256 cases per property:
//!
//! ```sh
//! PROPTEST_CASES=1000 cargo test property --release
//! ```

mod derive_props;
mod render_props;
