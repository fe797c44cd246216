pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, option, section, status, success, summary_row, warn};
pub use progress::{with_spinner, Spinner};
pub use table::{address_table, stats_table, ticker_table, TableBuilder};
pub use theme::{theme, Theme};
