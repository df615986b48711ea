use std::path::PathBuf;

use crate::config::CONFIG_DIR_ENV;

#[derive(clap::Parser, Debug)]
#[command(name = "cloudacct", version, about = "Cloud platform account manager")]
pub struct Cli {
    /// Directory holding config.json and imported credentials
    #[clap(long, global = true, env = CONFIG_DIR_ENV)]
    pub config_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[clap(short, long, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Manage imported credentials and the current subscription
    Account {
        #[clap(subcommand)]
        command: AccountCommands,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum AccountCommands {
    /// Import a publish settings file, PKCS#12 container or PEM certificate
    Import {
        /// File to import
        file: PathBuf,
        /// Do not register resource providers for the imported subscription
        #[clap(long, alias = "skipregister")]
        skip_register: bool,
    },
    /// Set the current subscription
    Set {
        /// Subscription name or id
        subscription: String,
    },
    /// List subscriptions from the imported publish settings
    List,
    /// Show the current endpoint and subscription
    Show,
    /// Remove the stored configuration and credentials
    Clear {
        /// Skip confirmation prompt
        #[clap(long)]
        force: bool,
    },
}
