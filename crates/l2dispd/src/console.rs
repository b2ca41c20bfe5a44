//! Interactive operator console on stdin.

use crate::daemon::Evaluation;
use ofdispatch_core::control::{self, Command};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Reads commands from stdin until `quit` or end of input.
pub async fn run(eval: &mut Evaluation) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", control::HELP);

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match control::parse(line) {
            Ok(Command::Mode(mode)) => eval.set_mode(mode),
            Ok(Command::Workers(count)) => {
                if let Err(err) = eval.set_worker_count(count) {
                    eprintln!("workers: {}", err);
                }
            }
            Ok(Command::Regen) => {
                eprintln!("regen: the learning switch has no link costs");
            }
            Ok(Command::Inject(count)) => eval.inject(count),
            Ok(Command::Stats) => println!("{}", eval.stats()),
            Ok(Command::Help) => println!("{}", control::HELP),
            Ok(Command::Quit) => break,
            Err(err) => {
                eprintln!("{}", err);
                println!("{}", control::HELP);
            }
        }
    }
    Ok(())
}
