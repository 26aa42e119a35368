mod picker_cmds;
mod session;
mod store_cmds;
mod theme_cmds;

pub use picker_cmds::{cmd_pick, cmd_search};
pub use session::Session;
pub use store_cmds::{cmd_clear_cache, cmd_random, cmd_scan, cmd_set, cmd_thumbnail, cmd_watch};
pub use theme_cmds::{cmd_color, cmd_preset, cmd_presets, cmd_theme};
