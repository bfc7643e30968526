use clap::Parser;
use weir::engine::RunError;
use weir::{logging, DriverError, Outcome, Settings};

fn main() {
    let settings = Settings::parse();
    logging::init(settings.verbose);

    // Failures are reported on stdout and the exit status stays 0.
    match weir::run(&settings) {
        Ok(Outcome::Summary(text)) => print!("{text}"),
        Ok(Outcome::Completed(_)) => {}
        Err(DriverError::Config(e)) => match e.line {
            Some(line) => println!("Config file error in line {line}: {}", e.kind),
            None => println!("Config file error: {}", e.kind),
        },
        Err(DriverError::Settings(e)) => println!("Settings error: {e}"),
        Err(DriverError::Run {
            role,
            rank,
            source: RunError::Transport { stream, source },
        }) => println!("Transport error: role {role} rank {rank}: stream '{stream}': {source}"),
        Err(DriverError::Run { role, rank, source }) => {
            println!("Pipeline error: role {role} rank {rank}: {source}")
        }
        Err(DriverError::Panicked { role, rank }) => {
            println!("Internal error: role {role} rank {rank} panicked")
        }
    }
}
