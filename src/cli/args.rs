use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "masjid", version, author, about = "Mosque prayer times, cache sync and iqama reminders")]
pub struct Cli {
    /// Mosque id (defaults to mosque.default_id from config.toml)
    #[arg(long, global = true)]
    pub mosque: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync the local cache with the backend
    Sync,
    /// Show today's prayer times and the countdown to the next prayer
    Times,
    /// Show the whole cached month
    Month,
    /// Simulate the app becoming active: sync, recompute, reschedule
    Resume,
    /// Iqama reminder management
    Notify {
        #[command(subcommand)]
        action: NotifyCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum NotifyCommands {
    /// Show or change reminder preferences, then reschedule
    Settings {
        /// Turn reminders on
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        /// Turn reminders off
        #[arg(long)]
        disable: bool,
        /// Per-prayer switch, e.g. --prayer fajr=off
        #[arg(long, value_name = "PRAYER=on|off")]
        prayer: Vec<String>,
        /// Per-session switch, e.g. --jummah 2=on
        #[arg(long, value_name = "N=on|off")]
        jummah: Vec<String>,
    },
    /// Rebuild reminders for the rest of the month
    Schedule,
    /// Cancel all prayer reminders
    Cancel,
    /// List scheduled reminders
    List,
    /// Print and remove reminders that are due
    Deliver,
}
