// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::env;
use tracing_subscriber::EnvFilter;

use community_portal::format::{long_date, month_name, short_date, WEEKDAY_HEADERS};
use community_portal::{
    build_calendar_grid, check_payment_status, lookup_history, Clock, GridCell, HistoryForm,
    IdentityForm, LookupOutcome, PortalConfig, Store,
};

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_logging();

    let config = PortalConfig::from_env()?;
    let clock = config.clock();

    let store = match Store::bootstrap(&clock) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("❌ Failed to initialize the portal database: {}", e);
            std::process::exit(1);
        }
    };

    let args: Vec<String> = env::args().skip(1).collect();
    let today = clock.today();

    match args.first().map(String::as_str) {
        None => run_ui_mode(&store, &config, today),
        Some("news") => run_news(&store, config.news_limit),
        Some("calendar") => run_calendar(&store, &args[1..], today),
        Some("status") => run_status(&store, &args[1..], today),
        Some("history") => run_history(&store, &args[1..], today),
        Some(other) => {
            print_usage();
            bail!("unknown command: {}", other)
        }
    }
}

/// Logs go to stderr so stdout (and the TUI screen) stay clean.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  community-portal                         open the terminal UI");
    eprintln!("  community-portal news");
    eprintln!("  community-portal calendar <month 1-12> <year>");
    eprintln!("  community-portal status <dpi> <house> <first-name> <last-name> <birth YYYY-MM-DD>");
    eprintln!("  community-portal history <house> <start YYYY-MM-DD> <end YYYY-MM-DD>");
}

fn run_news(store: &Store, limit: usize) -> Result<()> {
    println!("📰 Noticias");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let news = store.latest_news(limit);
    if news.is_empty() {
        println!("No hay noticias disponibles.");
    }

    for item in news {
        println!("\n{}", long_date(item.date));
        println!("  {}", item.body);
    }

    Ok(())
}

fn run_calendar(store: &Store, args: &[String], today: NaiveDate) -> Result<()> {
    use chrono::Datelike;

    let month: u32 = match args.first() {
        Some(m) => m.parse().context("month must be a number 1-12")?,
        None => today.month(),
    };
    let year: i32 = match args.get(1) {
        Some(y) => y.parse().context("year must be a number")?,
        None => today.year(),
    };

    let events = store.events_for_month(month, year);
    let grid = build_calendar_grid(month, year, &events)?;

    println!(
        "📅 {} {}",
        month_name(month).unwrap_or_default(),
        year
    );
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let header: Vec<String> = WEEKDAY_HEADERS.iter().map(|h| format!("{:>5}", h)).collect();
    println!("{}", header.join(""));

    for week in grid.weeks() {
        let line: String = week
            .iter()
            .map(|cell| match cell {
                GridCell::Empty => "     ".to_string(),
                GridCell::Day { day, events, .. } => {
                    let marker = if events.is_empty() { ' ' } else { '*' };
                    format!("{:>4}{}", day, marker)
                }
            })
            .collect();
        println!("{}", line);
    }

    if !events.is_empty() {
        println!("\nEventos:");
        for event in &events {
            println!("  {}  {}", short_date(event.date), event.title);
            if !event.description.is_empty() {
                println!("              {}", event.description);
            }
        }
    }

    Ok(())
}

fn run_status(store: &Store, args: &[String], today: NaiveDate) -> Result<()> {
    if args.len() != 5 {
        print_usage();
        bail!("status expects 5 arguments");
    }

    let form = IdentityForm {
        national_id: args[0].clone(),
        house_code: args[1].clone(),
        first_name: args[2].clone(),
        last_name: args[3].clone(),
        birth_date: args[4].clone(),
    };

    let identity = match form.validate(today) {
        Ok(identity) => identity,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(2);
        }
    };

    match check_payment_status(store, &identity, today) {
        LookupOutcome::NotRegistered => {
            println!("❌ Los datos ingresados no corresponden a ningún inquilino registrado");
        }
        LookupOutcome::Registered { resident, status } => {
            println!(
                "✓ {} {} - casa {}",
                resident.first_name, resident.last_name, resident.house_code
            );
            println!("  {}", status.as_str());
        }
    }

    Ok(())
}

fn run_history(store: &Store, args: &[String], today: NaiveDate) -> Result<()> {
    let form = HistoryForm {
        house_code: args.first().cloned().unwrap_or_default(),
        start: args.get(1).cloned().unwrap_or_default(),
        end: args.get(2).cloned().unwrap_or_default(),
    };

    let range = match form.validate(today) {
        Ok(range) => range,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(2);
        }
    };

    let history = lookup_history(store, &range);

    println!("💳 Historial de pagos - casa {}", range.house_code);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if history.is_empty() {
        println!("No se encontraron pagos en el rango de fechas seleccionado");
        return Ok(());
    }

    println!("{:<12} {:<12} {:<6} Estado", "Fecha", "Mes", "Año");
    for payment in history {
        println!(
            "{:<12} {:<12} {:<6} Pagado",
            short_date(payment.payment_date),
            month_name(payment.fee_month).unwrap_or_default(),
            payment.fee_year
        );
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(store: &Store, config: &PortalConfig, today: NaiveDate) -> Result<()> {
    let mut app = ui::App::new(store, config.news_limit, today)?;
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_store: &Store, _config: &PortalConfig, _today: NaiveDate) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin portal-server --features server");
    std::process::exit(1);
}
