//! Layered configuration assembly.
//!
//! Combines configuration fragments from any number of sources into a single
//! tree:
//! 1. **Sources** - YAML or JSON files read by a [`ConfigSource`]; missing
//!    files load as empty
//! 2. **Processor** - queues fragments by source name and merges them on export
//! 3. **Expansion** - `${dotted.path}` references resolve against everything
//!    merged before the fragment that contains them
//!
//! ## Merge Strategy
//! - Mappings: deep merge key by key, later fragments win
//! - Sequences: merged index by index, see [`merge_distinct`]
//! - Scalars: replaced
//!
//! ## Environment Variables
//! - `CONFIG_STACK_PROJECT_DIR` - Project config dir (default: `./config-stack`)
//! - `CONFIG_STACK_USER_DIR` - User config dir (default: `~/.config-stack`)

mod expand;
mod loader;
mod merge;
mod preprocess;
mod processor;
mod tree;

pub use expand::{Expander, NoExpansion, PropertyExpander, Unresolved};
pub use loader::{ConfigPaths, ConfigSource, JsonConfigLoader, YamlConfigLoader, load_file};
pub use merge::{merge_all, merge_distinct};
pub use preprocess::{DotNotation, Identity, Preprocessor};
pub use processor::ConfigProcessor;
pub use tree::{Tree, empty_tree, get_path, scalar_to_string};
