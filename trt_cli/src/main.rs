use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use trt_core::*;

#[derive(Parser)]
#[command(name = "trt")]
#[command(about = "Personal therapy tracking dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a dose
    Dose {
        /// Administered amount in mg
        #[arg(long)]
        mg: f64,

        /// Regimen id this dose belongs to
        #[arg(long)]
        regimen: Option<String>,

        /// Drug/preparation name
        #[arg(long)]
        product: Option<String>,

        /// Free-text note
        #[arg(long)]
        notes: Option<String>,

        /// When the dose was taken (RFC 3339 or YYYY-MM-DD, default now)
        #[arg(long)]
        date: Option<String>,
    },

    /// Record a lab result
    Lab {
        /// Measured level in ng/dL
        #[arg(long)]
        level: f64,

        /// Lab or panel name
        #[arg(long)]
        product: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        /// When the sample was drawn (RFC 3339 or YYYY-MM-DD, default now)
        #[arg(long)]
        date: Option<String>,
    },

    /// Record a subjective wellbeing score
    Wellbeing {
        /// Score from 1 (worst) to 10 (best)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=10))]
        score: u8,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long)]
        date: Option<String>,
    },

    /// List recorded entries, newest first
    Entries {
        /// Filter by kind (dose, lab, symptom)
        #[arg(long)]
        kind: Option<String>,

        /// Show at most this many entries
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Delete an entry by id
    Rm {
        id: String,
    },

    /// Manage regimens
    Regimen {
        #[command(subcommand)]
        command: RegimenCommands,
    },

    /// Show projected upcoming doses
    Upcoming {
        /// Occurrences to project per regimen
        #[arg(long)]
        count: Option<usize>,
    },

    /// Show the statistics snapshot
    Stats,

    /// Export all entries to a CSV file
    Export {
        /// Output file path
        #[arg(long)]
        output: PathBuf,
    },

    /// Delete all entries and regimens
    Reset {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum RegimenCommands {
    /// Add a new regimen
    Add {
        #[arg(long)]
        name: String,

        /// Planned dose per administration in mg
        #[arg(long)]
        mg: f64,

        /// Days between administrations
        #[arg(long)]
        interval: u32,

        #[arg(long, default_value = "")]
        preparation: String,

        /// Administration route (IM, SC, Transdermal, Oral, ...)
        #[arg(long, default_value = "IM")]
        route: String,

        /// Schedule anchor date (RFC 3339 or YYYY-MM-DD, default now)
        #[arg(long)]
        start: Option<String>,

        /// Target level in ng/dL (informational)
        #[arg(long)]
        target_level: Option<f64>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Update fields of an existing regimen
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        mg: Option<f64>,

        #[arg(long)]
        interval: Option<u32>,

        #[arg(long)]
        preparation: Option<String>,

        #[arg(long)]
        route: Option<String>,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        target_level: Option<f64>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a regimen and its dose entries
    Rm {
        id: String,
    },

    /// List regimens
    List,
}

fn main() -> Result<()> {
    // Initialize logging
    trt_core::logging::init();

    let cli = Cli::parse();

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let state_path = data_dir.join("state.json");

    match cli.command {
        Commands::Dose {
            mg,
            regimen,
            product,
            notes,
            date,
        } => cmd_dose(&state_path, mg, regimen, product, notes, date),
        Commands::Lab {
            level,
            product,
            notes,
            date,
        } => cmd_lab(&state_path, level, product, notes, date),
        Commands::Wellbeing { score, notes, date } => {
            cmd_wellbeing(&state_path, score, notes, date)
        }
        Commands::Entries { kind, limit } => cmd_entries(&state_path, kind, limit),
        Commands::Rm { id } => cmd_rm_entry(&state_path, id),
        Commands::Regimen { command } => cmd_regimen(&state_path, command),
        Commands::Upcoming { count } => cmd_upcoming(
            &state_path,
            count.unwrap_or(config.schedule.upcoming_per_regimen),
        ),
        Commands::Stats => cmd_stats(&state_path, config.schedule.upcoming_per_regimen),
        Commands::Export { output } => cmd_export(&state_path, &output),
        Commands::Reset { yes } => cmd_reset(&state_path, yes),
    }
}

fn cmd_dose(
    state_path: &std::path::Path,
    mg: f64,
    regimen: Option<String>,
    product: Option<String>,
    notes: Option<String>,
    date: Option<String>,
) -> Result<()> {
    let now = Utc::now();
    let date = parse_when(date.as_deref(), now)?;

    let state = TrackerState::load(state_path)?;
    if let Some(ref regimen_id) = regimen {
        if !state.regimens.iter().any(|r| &r.id == regimen_id) {
            eprintln!("Warning: no regimen with id {} exists.", regimen_id);
        }
    }

    let entry = Entry::dose(new_id(), date, regimen, mg, product, notes);
    let id = entry.id.clone();
    apply(&state, Action::AddEntry(entry)).save(state_path)?;

    println!("✓ Dose logged ({} mg)", mg);
    println!("  id: {}", id);
    Ok(())
}

fn cmd_lab(
    state_path: &std::path::Path,
    level: f64,
    product: Option<String>,
    notes: Option<String>,
    date: Option<String>,
) -> Result<()> {
    let now = Utc::now();
    let date = parse_when(date.as_deref(), now)?;

    let entry = Entry::lab(new_id(), date, level, product, notes);
    let id = entry.id.clone();
    TrackerState::update(state_path, |state| {
        apply(state, Action::AddEntry(entry))
    })?;

    println!("✓ Lab result logged ({} ng/dL)", level);
    println!("  id: {}", id);
    Ok(())
}

fn cmd_wellbeing(
    state_path: &std::path::Path,
    score: u8,
    notes: Option<String>,
    date: Option<String>,
) -> Result<()> {
    let now = Utc::now();
    let date = parse_when(date.as_deref(), now)?;

    let entry = Entry::wellbeing(new_id(), date, score, notes);
    let id = entry.id.clone();
    TrackerState::update(state_path, |state| {
        apply(state, Action::AddEntry(entry))
    })?;

    println!("✓ Wellbeing logged ({}/10)", score);
    println!("  id: {}", id);
    Ok(())
}

fn cmd_entries(
    state_path: &std::path::Path,
    kind: Option<String>,
    limit: Option<usize>,
) -> Result<()> {
    let state = TrackerState::load(state_path)?;

    let filter = kind.as_ref().and_then(|k| match k.to_lowercase().as_str() {
        "dose" => Some(EventType::Dose),
        "lab" => Some(EventType::Lab),
        "symptom" | "wellbeing" => Some(EventType::Symptom),
        _ => {
            eprintln!("Unknown kind: {}. Showing all entries.", k);
            None
        }
    });

    let mut entries = query::sort_by_date_desc(&state.entries);
    if let Some(event_type) = filter {
        entries.retain(|e| e.event_type == event_type);
    }
    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    if entries.is_empty() {
        println!("No entries recorded.");
        return Ok(());
    }

    for entry in &entries {
        let detail = match entry.event_type {
            EventType::Dose => format!("{} mg", entry.dosage_mg.unwrap_or(0.0)),
            EventType::Lab => format!("{} ng/dL", entry.level_ng_dl.unwrap_or(0.0)),
            EventType::Symptom => format!("{}/10", entry.wellbeing_score.unwrap_or(0)),
        };
        println!(
            "{}  {:<8}  {:<14}  {}  {}",
            entry.date.format("%Y-%m-%d %H:%M"),
            format!("{:?}", entry.event_type).to_lowercase(),
            detail,
            entry.id,
            entry.product.as_deref().unwrap_or(""),
        );
    }

    Ok(())
}

fn cmd_rm_entry(state_path: &std::path::Path, id: String) -> Result<()> {
    TrackerState::update(state_path, |state| {
        apply(state, Action::DeleteEntry(id))
    })?;

    // Missing ids are a silent no-op by design
    println!("✓ Entry removed (if it existed)");
    Ok(())
}

fn cmd_regimen(state_path: &std::path::Path, command: RegimenCommands) -> Result<()> {
    match command {
        RegimenCommands::Add {
            name,
            mg,
            interval,
            preparation,
            route,
            start,
            target_level,
            notes,
        } => {
            if interval == 0 {
                return Err(Error::Other(
                    "interval must be at least 1 day".into(),
                ));
            }

            let now = Utc::now();
            let regimen = Regimen {
                id: new_id(),
                name,
                preparation,
                route,
                dosage_mg: mg,
                interval_days: interval,
                start_date: parse_when(start.as_deref(), now)?,
                target_level,
                notes,
            };
            let id = regimen.id.clone();
            TrackerState::update(state_path, |state| {
                apply(state, Action::AddRegimen(regimen))
            })?;

            println!("✓ Regimen added");
            println!("  id: {}", id);
        }

        RegimenCommands::Update {
            id,
            name,
            mg,
            interval,
            preparation,
            route,
            start,
            target_level,
            notes,
        } => {
            let now = Utc::now();
            let start_date = match start {
                Some(s) => Some(parse_when(Some(&s), now)?),
                None => None,
            };
            let patch = RegimenPatch {
                name,
                preparation,
                route,
                dosage_mg: mg,
                interval_days: interval,
                start_date,
                target_level,
                notes,
            };
            TrackerState::update(state_path, |state| {
                apply(state, Action::UpdateRegimen { id, patch })
            })?;

            println!("✓ Regimen updated (if it existed)");
        }

        RegimenCommands::Rm { id } => {
            TrackerState::update(state_path, |state| {
                apply(state, Action::DeleteRegimen(id))
            })?;

            println!("✓ Regimen and its dose entries removed (if it existed)");
        }

        RegimenCommands::List => {
            let state = TrackerState::load(state_path)?;

            if state.regimens.is_empty() {
                println!("No regimens configured.");
                return Ok(());
            }

            for regimen in &state.regimens {
                println!(
                    "{}  {} mg {} every {} days (since {})",
                    regimen.id,
                    regimen.dosage_mg,
                    regimen.route,
                    regimen.interval_days,
                    regimen.start_date.format("%Y-%m-%d"),
                );
                println!("    {}", regimen.name);
                if let Some(target) = regimen.target_level {
                    println!("    target: {} ng/dL", target);
                }
            }
        }
    }

    Ok(())
}

fn cmd_upcoming(state_path: &std::path::Path, per_regimen: usize) -> Result<()> {
    let state = TrackerState::load(state_path)?;
    let now = Utc::now();

    let upcoming = upcoming_doses(&state.regimens, &state.entries, now, per_regimen);

    if upcoming.is_empty() {
        println!("No upcoming doses. Add a regimen first.");
        return Ok(());
    }

    println!("Upcoming doses:");
    for dose in &upcoming {
        let when = if dose.overdue {
            format!("OVERDUE by {} days", -dose.days_until)
        } else {
            format!("in {} days", dose.days_until)
        };
        println!(
            "  {}  {:<24}  {}",
            dose.date.format("%Y-%m-%d"),
            dose.regimen_name,
            when,
        );
    }

    Ok(())
}

fn cmd_stats(state_path: &std::path::Path, per_regimen: usize) -> Result<()> {
    let state = TrackerState::load(state_path)?;

    // Sampled once; projector and aggregator must see the same instant
    let now = Utc::now();
    let upcoming = upcoming_doses(&state.regimens, &state.entries, now, per_regimen);
    let stats = snapshot(&state.regimens, &state.entries, &upcoming, now);

    println!("╭─────────────────────────────────────────╮");
    println!("│  THERAPY SNAPSHOT");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!(
        "  Last dose:      {}",
        stats
            .last_dose_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "—".into())
    );
    println!(
        "  Next dose:      {}",
        stats
            .next_dose_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "—".into())
    );
    println!(
        "  Avg level 30d:  {}",
        stats
            .average_level_30d
            .map(|l| format!("{:.1} ng/dL ({} labs)", l, stats.labs_count_30d))
            .unwrap_or_else(|| "no labs in window".into())
    );
    println!(
        "  Level trend:    {}",
        stats
            .level_trend_delta
            .map(|d| format!("{:+.1} ng/dL", d))
            .unwrap_or_else(|| "—".into())
    );
    println!("  Adherence:      {:.0}%", stats.adherence_rate * 100.0);
    println!();

    Ok(())
}

fn cmd_export(state_path: &std::path::Path, output: &std::path::Path) -> Result<()> {
    let state = TrackerState::load(state_path)?;
    let count = export_entries(output, &state.entries)?;

    println!("✓ Exported {} entries", count);
    println!("  CSV: {}", output.display());
    Ok(())
}

fn cmd_reset(state_path: &std::path::Path, yes: bool) -> Result<()> {
    if !yes {
        return Err(Error::Other(
            "refusing to reset without --yes".into(),
        ));
    }

    TrackerState::update(state_path, |state| apply(state, Action::Reset))?;

    println!("✓ All entries and regimens removed");
    Ok(())
}

/// Fresh opaque id for a new entry or regimen
fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Parse a user-supplied date: RFC 3339, or YYYY-MM-DD at midnight UTC.
/// Absent dates mean "now".
fn parse_when(arg: Option<&str>, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let Some(raw) = arg else {
        return Ok(now);
    };

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }

    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = day
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| Error::Other(format!("invalid date: {}", raw)))?;
        return Ok(DateTime::from_naive_utc_and_offset(midnight, Utc));
    }

    Err(Error::Other(format!(
        "unrecognized date {} (expected RFC 3339 or YYYY-MM-DD)",
        raw
    )))
}
