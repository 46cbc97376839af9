//! threadtop: live per-thread CPU, disk I/O and run-queue latency view for
//! a single Linux process.
//!
//! Run: `threadtop -p <pid>`

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use anyhow::{bail, Context, Result};
use clap::Parser;

use threadtop::app::{App, Config};
use threadtop::jstack::JstackEnricher;
use threadtop::logbuf;
use threadtop::pidstat::{self, ColumnLayout, PidstatSource};
use threadtop::rank::SortField;
use threadtop::render::{RefreshView, StreamView};

/// Tool for analysing the active threads of a running process.
#[derive(Parser, Debug)]
#[command(name = "threadtop")]
#[command(version)]
#[command(about = "Tool for analysing active threads", long_about = None)]
struct Cli {
    /// Process ID
    #[arg(short, long = "pid")]
    pid: u32,

    /// Number of threads to show per sample; negative shows all
    #[arg(short = 'n', long = "number", default_value_t = 10, allow_negative_numbers = true)]
    number: i32,

    /// Max number of stack frames (only when jstack can be used)
    #[arg(short = 'm', long = "max-stack-depth", default_value_t = 1)]
    max_stack_depth: usize,

    /// Field used for sorting: cpu, rq, disk, disk-rd or disk-wr
    #[arg(short, long, default_value = "cpu")]
    sort: String,

    /// Select the way to display the info
    #[arg(short, long, value_enum, default_value_t = DisplayMode::Refresh)]
    display: DisplayMode,

    /// Turn off usage of jstack to retrieve thread info like name and stack
    #[arg(long = "no-jstack")]
    no_jstack: bool,

    /// Turn on logs for debugging purposes
    #[arg(long)]
    debug: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum DisplayMode {
    /// Append one colorized block per tick to stdout
    Terminal,
    /// Full-screen refreshing view
    Refresh,
}

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static PIDSTAT_PID: AtomicI32 = AtomicI32::new(0);

/// SIGINT/SIGTERM land here; async-signal-safe work only. Stopping the
/// sampling subprocess ends the report stream, and the pipeline then
/// unwinds through its normal cleanup path at the next read boundary.
extern "C" fn on_interrupt(_signal: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
    let child = PIDSTAT_PID.load(Ordering::SeqCst);
    if child > 0 {
        #[allow(unsafe_code)]
        unsafe {
            libc::kill(child, libc::SIGTERM);
        }
    }
}

fn install_interrupt_handler() {
    #[allow(unsafe_code)]
    unsafe {
        libc::signal(libc::SIGINT, on_interrupt as *const () as usize);
        libc::signal(libc::SIGTERM, on_interrupt as *const () as usize);
    }
}

/// `kill(pid, 0)`: probes existence without sending a signal.
fn process_exists(pid: u32) -> bool {
    #[allow(unsafe_code)]
    let status = unsafe { libc::kill(pid as libc::pid_t, 0) };
    status == 0
}

fn title_row(pid: u32, instrumented: bool, sort_description: &str) -> String {
    if instrumented {
        format!(
            "Generating thread stats for Process {pid} (Instrumented Java HotSpot) - {sort_description}"
        )
    } else {
        format!("Generating thread stats for Process {pid} - {sort_description}")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logbuf::init(cli.debug);
    install_interrupt_handler();

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| run(&cli)));

    // The terminal is back in cooked mode on every path by now (the view
    // guard released it during unwind if a tick panicked); the buffered
    // execution log can finally be printed.
    let entries = logbuf::drain();
    if !entries.is_empty() {
        println!("\nExecution log:\n");
        for entry in &entries {
            println!("{entry}");
        }
    }

    match outcome {
        Ok(result) => result,
        Err(_panic) => bail!("unexpected panic in the sampling loop"),
    }
}

fn run(cli: &Cli) -> Result<()> {
    if !process_exists(cli.pid) {
        bail!("PID {} not exist", cli.pid);
    }

    let version = pidstat::detect_version().context("pidstat is required on PATH")?;
    let layout = ColumnLayout::from_version(&version);
    let sort = SortField::parse(&cli.sort);
    let enricher = JstackEnricher::new(cli.pid, !cli.no_jstack);
    let title = title_row(cli.pid, enricher.is_instrumented(), sort.description());

    log::info!(
        "Running threadtop with pid {}.\nDebug is {}.\nsystat version {} (output with {} version)",
        std::process::id(),
        if cli.debug { "enabled" } else { "disabled" },
        version,
        layout.kind(),
    );

    let mut source = PidstatSource::spawn(cli.pid, layout)?;
    PIDSTAT_PID.store(source.child_id() as i32, Ordering::SeqCst);

    let config = Config {
        pid: cli.pid,
        top: cli.number,
        max_stack_depth: cli.max_stack_depth,
        sort,
        layout,
    };

    match cli.display {
        DisplayMode::Refresh => {
            let view = RefreshView::open(title)?;
            let mut app = App::new(config, enricher, view);
            app.run(source.blocks()?);
            // The view drops here, restoring the terminal before anything
            // else is printed.
        }
        DisplayMode::Terminal => {
            let view = StreamView::to_stdout(title);
            let mut app = App::new(config, enricher, view);
            app.run(source.blocks()?);
        }
    }

    source.drain_stderr();
    if INTERRUPTED.load(Ordering::SeqCst) {
        log::debug!("interrupted by operator");
    }
    Ok(())
}
