use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use slotbook_core::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "slotbook")]
#[command(about = "Conflict-free appointment booking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the snapshot file (empty string keeps everything in memory)
    #[arg(long, global = true)]
    data_file: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Book an appointment, optionally repeating
    Create {
        #[arg(long)]
        title: String,

        /// Start time (RFC 3339)
        #[arg(long, value_parser = parse_time)]
        start: DateTime<Utc>,

        /// End time (RFC 3339)
        #[arg(long, value_parser = parse_time)]
        end: DateTime<Utc>,

        #[arg(long)]
        description: Option<String>,

        /// Identifier to use instead of a generated one
        #[arg(long)]
        id: Option<String>,

        /// none, daily, weekly or monthly
        #[arg(long, default_value = "none", value_parser = parse_frequency)]
        repeat: Frequency,

        /// Last instant a repeat may start at (RFC 3339)
        #[arg(long, value_parser = parse_time)]
        until: Option<DateTime<Utc>>,
    },

    /// List appointments in start order
    List {
        #[arg(long, value_parser = parse_time)]
        from: Option<DateTime<Utc>>,

        #[arg(long, value_parser = parse_time)]
        to: Option<DateTime<Utc>>,

        /// Print JSON instead of one line per appointment
        #[arg(long)]
        json: bool,
    },

    /// Delete an appointment by identifier
    Delete { id: String },

    /// Write appointments to a CSV file
    Export {
        #[arg(long)]
        output: PathBuf,

        #[arg(long, value_parser = parse_time)]
        from: Option<DateTime<Utc>>,

        #[arg(long, value_parser = parse_time)]
        to: Option<DateTime<Utc>>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        // An explicit data file is all a run needs from the config.
        Err(e) if cli.data_file.is_some() => {
            eprintln!("warning: ignoring unreadable config: {}", e);
            Config::default()
        }
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    slotbook_core::logging::init_with_level(&config.logging.level);

    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, config: &Config) -> Result<()> {
    let data_file = cli
        .data_file
        .map(PathBuf::from)
        .unwrap_or_else(|| config.data.data_file.clone());
    let store = Store::open(data_file)?;

    match cli.command {
        Commands::Create {
            title,
            start,
            end,
            description,
            id,
            repeat,
            until,
        } => {
            let mut booking = Appointment::new(title, start, end).with_recurrence(Recurrence {
                frequency: repeat,
                end_time: until,
            });
            booking.id = id.unwrap_or_default();
            booking.description = description;
            cmd_create(&store, booking)
        }
        Commands::List { from, to, json } => cmd_list(&store, TimeRange::new(from, to), json),
        Commands::Delete { id } => cmd_delete(&store, &id),
        Commands::Export { output, from, to } => {
            cmd_export(&store, TimeRange::new(from, to), &output)
        }
    }
}

fn cmd_create(repo: &impl AppointmentRepository, booking: Appointment) -> Result<()> {
    match repo.create(booking) {
        Ok(created) => {
            println!("✓ Booked {} appointment(s)", created.len());
            for apt in &created {
                println!("  {}", format_line(apt));
            }
            Ok(())
        }
        Err(e) => {
            // Still report what is live in memory
            for apt in e.committed() {
                println!("  {}", format_line(apt));
            }
            Err(e)
        }
    }
}

fn cmd_list(repo: &impl AppointmentRepository, range: TimeRange, json: bool) -> Result<()> {
    let items = repo.list(range);

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No appointments.");
    }
    for apt in &items {
        println!("{}", format_line(apt));
    }
    Ok(())
}

fn cmd_delete(repo: &impl AppointmentRepository, id: &str) -> Result<()> {
    repo.delete(id)?;
    println!("✓ Deleted {}", id);
    Ok(())
}

fn cmd_export(repo: &impl AppointmentRepository, range: TimeRange, output: &Path) -> Result<()> {
    let items = repo.list(range);
    let count = export_csv(&items, output)?;
    println!("✓ Exported {} appointment(s)", count);
    println!("  CSV: {}", output.display());
    Ok(())
}

fn format_line(apt: &Appointment) -> String {
    let mut line = format!(
        "{}  {} - {}  {}",
        apt.id,
        apt.start_time.to_rfc3339(),
        apt.end_time.to_rfc3339(),
        apt.title
    );
    if apt.recurrence.frequency != Frequency::None {
        line.push_str(&format!(" ({})", apt.recurrence.frequency));
    }
    line
}

fn parse_time(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 time '{}': {}", s, e))
}

fn parse_frequency(s: &str) -> std::result::Result<Frequency, String> {
    s.parse::<Frequency>().map_err(|e| e.to_string())
}
