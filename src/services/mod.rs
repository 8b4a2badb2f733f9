//! Pipeline services, leaf-first: schema resolution, geolinks, survey
//! reading, QR assets, card rendering, page composition, and the
//! orchestrator tying them together.

pub mod card_renderer;
pub mod geolink;
pub mod page_compositor;
pub mod pipeline;
pub mod qr_assets;
pub mod schema_resolver;
pub mod survey_reader;
