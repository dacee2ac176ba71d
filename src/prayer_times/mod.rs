pub mod calculator;
pub mod formatter;
pub mod next_prayer;
pub mod time_codec;

pub use calculator::SalahAdhanLookup;
pub use formatter::{format_day, format_month, month_key, today_times};
pub use next_prayer::next_prayer;
