mod banks;
mod positions;
mod remote;
mod render;
mod wrap;

pub use banks::{cmd_banks_add, cmd_banks_list, cmd_banks_pdf_url, cmd_banks_remove, cmd_banks_update};
pub use positions::{
    cmd_positions_clear, cmd_positions_import, cmd_positions_place, cmd_positions_reset,
    cmd_positions_second_line, cmd_positions_set, cmd_positions_show,
};
pub use remote::{cmd_remote_banks, cmd_remote_set};
pub use render::{cmd_render, RenderArgs};
pub use wrap::cmd_wrap;

use std::path::Path;

use anyhow::{Context, Result};
use check_template::{JsonFileStorage, TemplateStore};

/// Open the JSON bank store at `path`
pub(crate) fn open_store(path: &Path) -> Result<TemplateStore<JsonFileStorage>> {
    TemplateStore::open(JsonFileStorage::new(path))
        .with_context(|| format!("failed to open bank store {}", path.display()))
}
