use clap::{Parser, Subcommand};

mod cmd;
mod core;

/// IP box calculator: qualifying income and costs of IP projects
#[derive(Parser, Debug)]
#[command(name = "ipbox", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify bookkeeping records against the configured rules
    Records(cmd::records::RecordsCommand),
    /// Show a project's hours per day or month
    Timesheet(cmd::timesheet::TimesheetCommand),
    /// Apportion qualifying records and compute the qualified income
    Summary(cmd::summary::SummaryCommand),
    /// Print the expected input formats
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Records(records) => records.exec(),
        Command::Timesheet(timesheet) => timesheet.exec(),
        Command::Summary(summary) => summary.exec(),
        Command::Schema(schema) => schema.exec(),
    }
}
