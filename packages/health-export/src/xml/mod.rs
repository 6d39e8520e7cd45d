//! XML reading for health-data exports.

mod utils;

pub use utils::{decode_input, element_children, get_tag_name, parse_document, read_nodes, to_record_node};
