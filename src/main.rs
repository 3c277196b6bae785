use anyhow::Result;
use calgrid::commands::{self, CommandArgs, Reply};
use calgrid::env_manager::{self, LOG_LEVEL_VAR};
use calgrid::{Config, EventStore};
use env_logger::Env;
use log::{error, info};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

fn main() -> Result<()> {
    let env_file = env_manager::load_env_file();

    // Initialize logging with custom format
    env_logger::Builder::from_env(Env::default().filter_or(LOG_LEVEL_VAR, "info"))
        .format(|buf, record| {
            use chrono::Local;
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    info!("Starting calgrid terminal");
    if let Some(path) = env_file {
        info!("Loaded environment from {:?}", path);
    }

    let config = Config::load()?;
    let storage = config.open_storage()?;
    info!("Using event storage at {}", storage.path().display());
    let mut store = EventStore::open(storage);

    let mut rl = DefaultEditor::new()?;
    println!("Welcome to calgrid! Type 'help' for commands.");

    loop {
        let readline = rl.readline(">> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                let reply = CommandArgs::parse(&line)
                    .and_then(|args| commands::execute(&mut store, &config.defaults, &args));
                match reply {
                    Ok(Reply::Text(text)) => println!("{}", text),
                    Ok(Reply::Exit) => break,
                    Err(err) => error!("Failed to process command: {:#}", err),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}
