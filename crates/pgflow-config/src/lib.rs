//! pgflow 設定ファイル (pgflow.kdl) の発見とパース

pub mod discovery;
pub mod error;
pub mod model;
pub mod parser;

pub use discovery::{
    CONFIG_FILENAME, CONFIG_PATH_ENV, find_config_file, find_config_from, get_config_dir,
    project_root,
};
pub use error::*;
pub use model::{PRISMA_PROVIDER, PgflowConfig, ProviderSettings};
pub use parser::{load_config, parse_config};
