pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{empty, error, header, info, is_quiet, success, summary_row, warn};
pub use progress::Spinner;
pub use table::{render, stats_table, TableBuilder};
pub use theme::{theme, Theme};
