//! `replay-verify` — the CLI surface named in spec.md §6: one command,
//! `--snapshot/-s --accountsdb/-a --path/-p --out/-o`, exit code 0 on a
//! clean replay and non-zero with a one-line diagnostic otherwise.
//!
//! No `clap`-derive CLI survives anywhere in the retrieval pack (the
//! teacher's `ledger-tool`/`rbpf-cli` binaries ship only their
//! `Cargo.toml`s, no `main.rs`) — this file's shape follows the workspace's
//! `clap = { features = ["derive"] }` dependency pin and `env_logger`
//! convention, not a literal grounding source; see DESIGN.md.

use {
    clap::Parser,
    replay_sysvar::SysvarCache,
    replay_verify::{decode_account_table, decode_scenario, run_scenario, MapAccountLoader},
    std::{fs, path::PathBuf, process::ExitCode},
};

#[derive(Parser)]
#[command(name = "replay-verify", about = "Replay a single recorded instruction against the loader/VM/runtime stack")]
struct Cli {
    /// Bincode-encoded `HashMap<Pubkey, Account>` standing in for the
    /// snapshot-derived account store (spec.md §1's `GetAccount` boundary).
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Bincode-encoded `HashMap<Pubkey, Account>` overlay, merged over
    /// `--snapshot` (accountsdb entries win on key collision).
    #[arg(short, long)]
    accountsdb: Option<PathBuf>,

    /// Bincode-encoded `Scenario` fixture: the accounts, instruction, and
    /// any BPF program images to replay.
    #[arg(short, long)]
    path: PathBuf,

    /// Where to write the one-line verdict. Defaults to stdout.
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn write_line(out: &Option<PathBuf>, line: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => fs::write(path, format!("{line}\n"))?,
        None => println!("{line}"),
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            let _ = write_line(&cli.out, &format!("error: {e}"));
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<bool> {
    let mut accounts = match &cli.snapshot {
        Some(path) => decode_account_table(&fs::read(path)?)?,
        None => Default::default(),
    };
    if let Some(path) = &cli.accountsdb {
        accounts.extend(decode_account_table(&fs::read(path)?)?);
    }
    let loader = MapAccountLoader(accounts);
    let sysvars = SysvarCache::fill(&loader);

    let scenario = decode_scenario(&fs::read(&cli.path)?)?;
    let outcome = run_scenario(&scenario, &sysvars)?;

    for line in &outcome.log {
        log::info!("{line}");
    }

    match &outcome.error {
        None => {
            write_line(&cli.out, "ok")?;
            Ok(true)
        }
        Some(e) => {
            write_line(&cli.out, &format!("fail: {e:?}"))?;
            Ok(false)
        }
    }
}
