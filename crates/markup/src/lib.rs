//! Markup builders for analysis results: the facts list, the narrative block
//! and the full results page.

pub mod facts;
pub mod links;
pub mod narrative;
pub mod page;

pub use facts::{render_facts, SOURCE_LINK_LABEL};
pub use links::{is_safe_link, safe_link_target, BLOCKED_LINK_TARGET};
pub use narrative::{render_narrative, CommonMarkDelegate, MarkupDelegate};
pub use page::{render_page, PageDocument};
