use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    cursor::MoveToColumn,
    execute, queue,
    style::{Print, Stylize},
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
    tty::IsTty,
};
use log::{info, warn};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin, Write},
    path::PathBuf,
};
use typerank::{
    config::{Config, ConfigStore, FileConfigStore},
    content::{ContentSource, ContentSupplier, Difficulty},
    history::SessionHistory,
    leaderboard::Leaderboard,
    mode::GameMode,
    record::SessionRecord,
    runtime::{CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    session::{Outcome, SessionStatus, TypingSession},
    time_series::wpm_range,
};

/// Seconds of each session ignored when reporting the wpm range.
const WARMUP_SECS: u64 = 3;

/// terminal typing trainer with live metrics and a session leaderboard
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// name shown on the leaderboard
    #[clap(short = 'u', long)]
    user: Option<String>,

    /// timed or free practice
    #[clap(short = 'm', long, value_enum)]
    mode: Option<GameMode>,

    /// word list to draw from
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// number of words or sentences per round
    #[clap(short = 'n', long)]
    count: Option<usize>,

    /// time limit of a timed round
    #[clap(short = 's', long)]
    seconds: Option<u64>,

    /// number of rounds to play
    #[clap(short = 'r', long, default_value_t = 1)]
    rounds: usize,

    /// number of leaderboard rows to show
    #[clap(short = 't', long)]
    top: Option<usize>,

    /// write the final leaderboard to this csv file
    #[clap(long)]
    export_csv: Option<PathBuf>,
}

impl Cli {
    /// Layer command line flags over the stored configuration.
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(user) = &self.user {
            cfg.user_name = user.clone();
        }
        if let Some(mode) = self.mode {
            cfg.mode = mode;
        }
        if let Some(difficulty) = self.difficulty {
            cfg.difficulty = difficulty;
        }
        if let Some(count) = self.count {
            cfg.units_per_session = count;
        }
        if let Some(seconds) = self.seconds {
            cfg.timed_duration_secs = seconds;
        }
        if let Some(top) = self.top {
            cfg.leaderboard_size = top;
        }
        cfg
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(user) = &cli.user {
        reject_blank_user(user);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    reject_blank_user(&config.user_name);
    if let Err(e) = store.save(&config) {
        warn!("could not save config to {}: {e}", store.path().display());
    }

    let source = ContentSource::builtin(config.difficulty)?;
    let mut board = Leaderboard::new();
    let mut history = SessionHistory::new();

    enable_raw_mode()?;
    let played = play(&config, &source, cli.rounds, &mut board, &mut history);
    disable_raw_mode()?;
    let records = played?;

    print_summary(&config, &records, &board, &history);

    if let Some(path) = &cli.export_csv {
        board.write_csv(File::create(path)?, config.leaderboard_size)?;
        println!("Leaderboard written to {}", path.display());
    }

    Ok(())
}

/// Leaderboard entries need a name, so refuse to start a round without one.
fn reject_blank_user(name: &str) {
    if name.trim().is_empty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::InvalidValue, "user name must not be blank")
            .exit();
    }
}

/// Plays up to `rounds` sessions, stopping early when the user quits one.
fn play(
    config: &Config,
    source: &ContentSource,
    rounds: usize,
    board: &mut Leaderboard,
    history: &mut SessionHistory,
) -> Result<Vec<(SessionRecord, Option<(f64, f64)>)>, Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    let mut stdout = io::stdout();
    let mut records = Vec::new();

    for round in 1..=rounds {
        let mut supplier = ContentSupplier::with_max_sentence_len(config.max_sentence_len);
        supplier.load(source, config.units_per_session);
        let mut session = TypingSession::new(&config.user_name, config.mode, supplier)
            .with_duration(config.timed_duration_secs);

        info!("round {round} of {rounds} for {}", config.user_name);
        let Some(record) = play_round(&runner, &mut session, &mut stdout)? else {
            break;
        };

        execute!(
            stdout,
            Print(format!("\r\nround {round}: {record}\r\n"))
        )?;
        board.add_session(&record)?;
        history.add(record.clone());
        records.push((record, wpm_range(session.samples(), WARMUP_SECS)));
    }

    Ok(records)
}

fn play_round<E: EventSource, T: Ticker, W: Write>(
    runner: &Runner<E, T>,
    session: &mut TypingSession,
    out: &mut W,
) -> io::Result<Option<SessionRecord>> {
    draw(out, session)?;

    while !session.has_finished() {
        let done = session.handle(runner.step());
        draw(out, session)?;
        if done.is_some() {
            return Ok(done);
        }
    }

    Ok(None)
}

/// Redraw the status line: countdown, the current unit with typed characters colored, live stats.
fn draw<W: Write>(out: &mut W, session: &TypingSession) -> io::Result<()> {
    queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;

    if session.status() == SessionStatus::Aborted {
        queue!(out, Print("aborted\r\n"))?;
        return out.flush();
    }

    if let Some(secs) = session.seconds_remaining() {
        queue!(out, Print(format!("[{secs:>3}s] ").dim()))?;
    }

    let input = session.input();
    for (idx, expected) in session.prompt().chars().enumerate() {
        match input.get(idx).map(|i| i.outcome) {
            Some(Outcome::Correct) => queue!(out, Print(expected.green()))?,
            Some(Outcome::Incorrect) => queue!(out, Print(expected.red().underlined()))?,
            None if idx == input.len() => queue!(out, Print(expected.reverse()))?,
            None => queue!(out, Print(expected))?,
        }
    }

    if session.has_started() {
        queue!(out, Print(format!("  {}", session.recorder()).dim()))?;
    }

    out.flush()
}

fn print_summary(
    config: &Config,
    records: &[(SessionRecord, Option<(f64, f64)>)],
    board: &Leaderboard,
    history: &SessionHistory,
) {
    println!();
    if records.is_empty() {
        println!("No rounds completed.");
        return;
    }

    for (record, range) in records {
        println!("{record}");
        println!(
            "  grade {}, {} errors/min, {} of {} characters correct",
            record.grade(),
            record.error_rate(),
            record.correct_chars(),
            record.total_chars()
        );
        if let Some((low, high)) = range {
            println!("  wpm ranged from {low:.1} to {high:.1}");
        }
    }

    let user = config.user_name.as_str();
    println!();
    println!(
        "{user}: {} games, average {:.1} wpm, {:.1}% accuracy, best {:.1} wpm",
        history.total_games(user),
        history.average_wpm(user),
        history.average_accuracy(user),
        history.best_wpm(user)
    );
    if let Some(dev) = history.wpm_std_dev(user) {
        println!("  consistency: ±{dev:.1} wpm");
    }

    println!();
    print!("{}", board.render(config.leaderboard_size));
    if let Some(rank) = board.user_rank(user) {
        println!("{user} is ranked #{rank}");
    }
    println!("{}", board.statistics());
}
