use std::{
    io::{self, Write},
    path::PathBuf,
    thread,
    time::{Duration, SystemTime},
};

use clap::Parser;
use totpwatch::{Authenticator, Session, SessionConfig, Tick};

/// Shows the current TOTP code for one account, refreshed in place.
#[derive(Debug, Parser)]
struct Args {
    /// otpauth secrets file, one URI per line
    #[arg(long, env = "TOTPWATCH_SECRETS_FILE", default_value = "secrets.txt")]
    secrets: PathBuf,

    /// File remembering the last selected account
    #[arg(long, env = "TOTPWATCH_PREFERENCES_FILE", default_value = "preferences.json")]
    preferences: PathBuf,

    /// Refresh interval in milliseconds
    #[arg(long, env = "TOTPWATCH_TICK_MS", default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,

    /// Account to select, by display name
    #[arg(long)]
    account: Option<String>,

    /// Stop after this many refreshes (runs forever when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Print the account names and exit
    #[arg(long)]
    list: bool,
}

fn now_millis() -> anyhow::Result<u64> {
    let since_epoch = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH)?;
    Ok(since_epoch.as_millis() as u64)
}

fn progress_bar(tick: &Tick, width: usize) -> String {
    let filled = (tick.remaining_fraction * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), " ".repeat(width - filled.min(width)))
}

fn render(out: &mut impl Write, account: &str, tick: &Tick) -> io::Result<()> {
    let marker = if tick.is_expiring() { "!" } else { " " };
    write!(
        out,
        "\r{account}  {}  {} {:>2}s{marker}",
        tick.code,
        progress_bar(tick, 30),
        tick.remaining_seconds
    )?;
    out.flush()
}

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args = Args::parse();
    let config = SessionConfig::default()
        .with_secrets_path(args.secrets)
        .with_preferences_path(args.preferences)
        .with_tick_interval(Duration::from_millis(args.tick_ms));

    let (mut session, report) = Session::open(&config);
    if let Some(e) = report.credentials_error {
        anyhow::bail!(e);
    }

    if args.list {
        for name in session.list_accounts() {
            println!("{name}");
        }
        return Ok(());
    }

    if let Some(account) = &args.account {
        session.select_account(account, now_millis()?)?;
    }

    let account = session.selected().unwrap_or_default().to_string();
    let mut stdout = io::stdout();
    let mut remaining = args.ticks;

    while remaining != Some(0) {
        let tick = session.tick(now_millis()?)?;
        render(&mut stdout, &account, &tick)?;

        remaining = remaining.map(|n| n - 1);
        thread::sleep(config.tick_interval);
    }
    writeln!(stdout)?;

    Ok(())
}
