use clap::Parser;
use sps_pricing::PricingTables;

mod io;
pub use io::*;

mod commands;
pub use commands::*;

// The top-level arguments -- presently just which subcommand to execute
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct BaseArgs {
    #[command(subcommand)]
    pub command: Commands,
}

impl BaseArgs {
    pub fn evaluate(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Quote { io, storefront } => {
                let input = io.read()?;
                let request = serde_json::from_reader::<_, QuoteRequest>(input)?;
                let table = price_table(request, storefront.into(), &PricingTables::default())?;
                let output = io.write()?;
                serde_json::to_writer_pretty(output, &table)?;
            }
            Commands::Territories { output, storefront } => {
                let table = territory_table(storefront.into());
                let output = output.write()?;
                serde_json::to_writer_pretty(output, &table)?;
            }
        }

        Ok(())
    }
}
