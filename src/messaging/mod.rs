//! Cross-context messaging between the background process, content scripts
//! and the popup

pub mod router;
pub mod menu;
pub mod background;
pub mod content;

pub use background::Background;
pub use content::{prompt_for_values, BackgroundChannel, ContentScript, PageHost, VariablePrompter};
pub use menu::{build_menu, template_id_from_menu_item, MenuItem};
pub use router::{MessageRouter, RouterConfig, TabHost};
