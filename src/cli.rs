use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "scout",
    version,
    about = "Tracks promo codes from gaming news sites and diffs property listings between runs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scrape code sources and record any codes not seen before
    Codes,

    /// Move codes from the new list to the used list
    ///
    /// Example: scout mark-used STAYSHARP SHARPSTREAM
    MarkUsed {
        /// Codes to mark, matched exactly
        #[arg(required = true)]
        codes: Vec<String>,
    },

    /// Print the stored new and used codes without scraping
    ListCodes,

    /// Scrape every listing page and merge the results into the snapshot
    Listings,
}
