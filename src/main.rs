use std::path::PathBuf;
use std::process;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use perpetual_calendar::calendar::{display, CalendarEvent, MudDate};
use perpetual_calendar::persistence;
use perpetual_calendar::{Calendar, CalendarError, CalendarRegistry, DisplayMode, EngineConfig};

mod logging;

#[derive(Parser, Debug)]
#[command(name = "perpetual_calendar")]
#[command(about = "Inspect and advance rule-driven fantasy calendars")]
struct Args {
    /// Calendar file to load (save file or bare definition)
    #[arg(short, long)]
    calendar: Option<PathBuf>,

    /// Name of a registered calendar, used when no file is given
    #[arg(short, long, default_value = "Common Reckoning")]
    name: String,

    /// Engine config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of calendar files overriding the embedded defaults
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// List registered calendars and exit
    #[arg(long)]
    list: bool,

    /// Set the current date first (e.g. "3-mar-1372")
    #[arg(short, long)]
    date: Option<String>,

    /// Move the current date by this many days
    #[arg(long, allow_hyphen_values = true)]
    advance_days: Option<i64>,

    /// Move the current date by this many months
    #[arg(long, allow_hyphen_values = true)]
    advance_months: Option<i64>,

    /// Skip intercalary months when advancing months
    #[arg(long)]
    ignore_intercalaries: bool,

    /// Keep the day of the month when advancing months, clamped to the month length
    #[arg(long)]
    preserve_day: bool,

    /// Move the current date by this many years
    #[arg(long, allow_hyphen_values = true)]
    advance_years: Option<i64>,

    /// When advancing years, keep the number of days since the start of the year
    /// instead of the month and day
    #[arg(long)]
    normalise_days: bool,

    /// Display style: short, long, wordy, or a $-mask such as "$w $o of $mf"
    #[arg(long, default_value = "long")]
    display: String,

    /// Print the month layout of a year
    #[arg(long, allow_hyphen_values = true)]
    year_summary: Option<i64>,

    /// Print a random birthday for someone of this age
    #[arg(long)]
    birthday_age: Option<i64>,

    /// Random seed for birthdays (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Print the boundaries crossed by each change
    #[arg(long)]
    events: bool,

    /// Write the calendar, with its new current date, to this file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();
    logging::init(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), CalendarError> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if args.data_dir.is_some() {
        config.data_dir = args.data_dir.clone();
    }

    let mut registry = match &config.data_dir {
        Some(dir) => CalendarRegistry::load_from(dir, &config)?,
        None => CalendarRegistry::defaults(&config)?,
    };

    if args.list {
        for calendar in registry.iter() {
            println!(
                "{:>4}  {:<24} {} months, {} weekdays, today {}",
                calendar.id(),
                calendar.name(),
                calendar.month_definitions().len(),
                calendar.weekdays().len(),
                calendar.current_date()
            );
        }
        return Ok(());
    }

    let mut calendar = match &args.calendar {
        Some(path) => persistence::load_calendar(path, &config)?,
        None => take_by_name(&mut registry, &args.name)?,
    };

    let mode: DisplayMode = args
        .display
        .parse()
        .map_err(CalendarError::Definition)?;

    if args.events {
        calendar.subscribe(Box::new(|event: CalendarEvent, date: &MudDate| {
            println!("  {:?} -> {}", event, date);
        }));
    }

    println!("Calendar: {} (id {})", calendar.name(), calendar.id());

    if let Some(text) = &args.date {
        calendar.set_date(text)?;
    }
    if let Some(n) = args.advance_years {
        calendar.advance_years(n, args.normalise_days)?;
    }
    if let Some(n) = args.advance_months {
        calendar.advance_months(n, args.ignore_intercalaries, args.preserve_day);
    }
    if let Some(n) = args.advance_days {
        calendar.advance_days(n);
    }

    println!("Today: {}", calendar.display_date(&mode));

    if let Some(age) = args.birthday_age {
        let seed = args.seed.unwrap_or_else(rand::random);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let birthday = calendar.random_birthday(age, &mut rng)?;
        println!(
            "Born (age {}, seed {}): {}",
            age,
            seed,
            display::render(&birthday, &mode)
        );
    }

    if let Some(year) = args.year_summary {
        print_year_summary(&calendar, year);
    }

    if let Some(path) = &args.save {
        persistence::save_calendar(&mut calendar, path)?;
        println!("Saved to {}", path.display());
    }

    Ok(())
}

fn take_by_name(registry: &mut CalendarRegistry, name: &str) -> Result<Calendar, CalendarError> {
    let id = registry
        .by_name(name)
        .map(|c| c.id())
        .or_else(|| name.parse().ok())
        .ok_or_else(|| CalendarError::Definition(format!("no calendar named '{}'", name)))?;
    registry.remove(id).ok_or(CalendarError::UnknownCalendar { id })
}

fn print_year_summary(calendar: &Calendar, year: i64) {
    let layout = calendar.create_year(year);
    let weekdays = calendar.weekdays();
    println!(
        "Year {}: {} days, {} weekdays, opens on {}",
        year,
        layout.days(),
        layout.weekdays(),
        weekdays[layout.first_weekday_index() % weekdays.len()]
    );
    for (index, month) in layout.months().iter().enumerate() {
        let opens = layout
            .weekday_index(index, 1, weekdays.len())
            .map(|i| weekdays[i].as_str())
            .unwrap_or("-");
        println!(
            "  {:>2}. {:<6} {:<16} {:>3} days  first day {}{}",
            month.true_order(),
            month.alias(),
            month.full_name(),
            month.days(),
            opens,
            if month.is_intercalary() { "  (intercalary)" } else { "" }
        );
        for (day, name) in month.day_names() {
            println!("        {:>3}: {}", day, name.full_name);
        }
    }
}
