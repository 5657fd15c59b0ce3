use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "steward",
    version,
    about = "Batch account maintenance: avatars, profiles, and loyalty-point gifts"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Accounts file. Lines of `name:secret`, `name:secret:seed`, or
    /// `name:secret:file.maFile`; a JSON array also works.
    #[arg(long, global = true, default_value = "accounts/accounts.txt")]
    pub accounts: PathBuf,

    /// Seconds to wait between accounts in sequential runs
    #[arg(long, global = true, default_value_t = 5)]
    pub delay: u64,

    /// How many accounts may be in flight at once
    #[arg(long, global = true, default_value_t = 1)]
    pub max_concurrent: usize,

    /// Sign-in attempt budget per account, counting the first try
    #[arg(long, global = true, default_value_t = 3)]
    pub retries: u32,

    /// Service gateway root, overriding the built-in default
    #[arg(long, global = true)]
    pub service_url: Option<String>,

    /// Write outcomes and the summary to a timestamped JSON file
    #[arg(long, global = true)]
    pub save_results: bool,

    /// Debug-level logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Set a new avatar on every account
    Avatar {
        /// Directory scanned for image files (jpg/jpeg/png/gif/bmp)
        #[arg(long, default_value = "avatars")]
        avatars: PathBuf,
    },

    /// Update profile fields on every account
    Profile {
        /// Directory holding profile_names.txt, real_names.txt and
        /// about_me.txt (the last one split on `---` separators)
        #[arg(long, default_value = "profile_data")]
        data: PathBuf,
    },

    /// Send each account's best affordable loyalty gift to one recipient
    Gift {
        /// Recipient account id on the service
        #[arg(long, conflicts_with = "recipient_login")]
        recipient_id: Option<String>,

        /// Recipient's login name; must appear in the accounts file and is
        /// excluded from the sending roster
        #[arg(long)]
        recipient_login: Option<String>,
    },
}
