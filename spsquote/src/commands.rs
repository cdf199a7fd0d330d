use super::{IOArgs, OutputArgs};
use clap::{Subcommand, ValueEnum};
use sps_core::models::Storefront;

mod quote;
pub use quote::{PriceTable, QuoteError, QuoteRequest, TerritoryRow, price_table, territory_table};

#[derive(Subcommand)]
pub enum Commands {
    /// Calculate localized prices for a quote request
    Quote {
        #[command(flatten)]
        io: IOArgs,

        /// The storefront to price for
        #[arg(short, long, default_value = "app-store")]
        storefront: StorefrontArg,
    },

    /// List the territories a storefront sells into
    Territories {
        #[command(flatten)]
        output: OutputArgs,

        /// The storefront to list
        #[arg(short, long, default_value = "app-store")]
        storefront: StorefrontArg,
    },
}

// The core storefront type knows nothing of clap, so it is mirrored here
#[derive(Clone, Copy, ValueEnum)]
pub enum StorefrontArg {
    Marketplace,
    AppStore,
}

impl From<StorefrontArg> for Storefront {
    fn from(value: StorefrontArg) -> Self {
        match value {
            StorefrontArg::Marketplace => Storefront::Marketplace,
            StorefrontArg::AppStore => Storefront::AppStore,
        }
    }
}
