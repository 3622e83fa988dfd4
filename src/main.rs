mod cli_utils;

use std::{io::Write, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use bounded_cursor::store::{store_options::StoreOptions, Store, StoreIterator};

#[derive(Parser)]
#[clap(name = "bounded-cursor", version)]
struct Args {
    /// Largest accepted key, in bytes
    #[arg(long, default_value_t = StoreOptions::new_with_defaults().max_key_size_bytes)]
    max_key_size: usize,

    /// Largest accepted value, in bytes
    #[arg(long, default_value_t = StoreOptions::new_with_defaults().max_value_size_bytes)]
    max_value_size: usize,
}

#[derive(Parser)]
#[clap(name = "", no_binary_name = true)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Get {
        key: String,
    },
    Put {
        key: String,
        value: String,
    },
    Delete {
        key: String,
    },
    Scan {
        lower: Option<String>,
        upper: Option<String>,
        #[arg(long)]
        reverse: bool,
    },
    Prefix {
        prefix: String,
    },
    Fill {
        lower: u64,
        upper: u64,
    },
    Load {
        path: PathBuf,
    },
    Quit,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bounded_cursor=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let store = Store::open(StoreOptions {
        max_key_size_bytes: args.max_key_size,
        max_value_size_bytes: args.max_value_size,
    })?;
    loop {
        print!("$ ");
        std::io::stdout().flush()?;

        let Some(line) = cli_utils::readline()? else {
            break;
        };
        let args = shlex::split(&line).unwrap_or_default();
        if args.is_empty() {
            continue;
        }
        let command = match Cli::try_parse_from(args) {
            Ok(cli) => cli.command,
            Err(err) => {
                err.print()?;
                continue;
            }
        };
        if let Command::Quit = command {
            break;
        }
        if let Err(err) = execute(&store, command) {
            error!("{:#}", err);
        }
    }
    store.close()
}

fn execute(store: &Store, command: Command) -> Result<()> {
    match command {
        Command::Get { key } => {
            if let Some(value) = store.get(key.as_bytes())? {
                println!("{}={}", key, String::from_utf8_lossy(&value));
            }
        }
        Command::Put { key, value } => {
            store.put(key.as_bytes(), value.as_bytes())?;
        }
        Command::Delete { key } => {
            store.delete(key.as_bytes())?;
        }
        Command::Scan { lower, upper, reverse } => {
            let lower = lower.as_ref().map(|v| v.as_bytes());
            let upper = upper.as_ref().map(|v| v.as_bytes());
            let iterator = if reverse {
                store.reverse_scan(lower, upper)?
            } else {
                store.scan(lower, upper)?
            };
            print_entries(iterator)?;
        }
        Command::Prefix { prefix } => {
            print_entries(store.scan_prefix(prefix.as_bytes())?)?;
        }
        Command::Fill { lower, upper } => {
            for i in lower..=upper {
                store.put(
                    format!("{:?}", i).as_bytes(),
                    format!("value@{:?}", i).as_bytes(),
                )?;
            }
        }
        Command::Load { path } => {
            let loaded = store.load(&path)?;
            println!("loaded {} entries", loaded);
        }
        Command::Quit => {}
    }
    Ok(())
}

fn print_entries(mut iterator: StoreIterator) -> Result<()> {
    for kv in iterator.by_ref() {
        println!(
            "{}={}",
            String::from_utf8_lossy(&kv.key),
            String::from_utf8_lossy(&kv.value)
        );
    }
    // running off the end of the range is not an error, a failing engine is
    iterator.finish().context("scan stopped early")?;
    Ok(())
}
