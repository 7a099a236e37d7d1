pub mod app;
pub mod chart;
#[cfg(feature = "cli")]
pub mod cli;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod layout;
pub mod layout_dump;
pub mod render;
pub mod theme;
pub mod tree;
pub mod zoom;

pub use app::{AppState, RenderResult, Viewport};
pub use chart::{Chart, ColumnSelection};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, load_config};
pub use data::{Dataset, Row};
pub use error::CirclePackError;
pub use export::{ExportDocument, export_svg};
pub use layout::{NodeId, PackOptions, PackedTree, pack};
pub use render::render_interactive;
pub use tree::{GroupNode, build_tree};
