use std::io::{self, Write};
use std::path::Path;
use annvec::{Config, EngineConfig, QueryEngine, RecordId, VecError};

const DEFAULT_K: usize = 3;

pub enum Command {
    Insert { id: RecordId, label: String, vec: Vec<f32> },
    Search { vec: Vec<f32>, k: usize },
    Get { id: RecordId },
    List,
    Count,
    Demo,
    Save { path: String },
    Load { path: String },
}

/// The five labeled fruit vectors used throughout the docs and tests.
pub fn demo_records() -> Vec<(RecordId, String, Vec<f32>)> {
    vec![
        (1, "Red apple".to_string(), vec![1.0, 0.0, 0.0]),
        (2, "Green apple".to_string(), vec![0.0, 1.0, 0.0]),
        (3, "Blue berry".to_string(), vec![0.0, 0.0, 1.0]),
        (4, "Yellow banana".to_string(), vec![1.0, 1.0, 0.0]),
        (5, "Purple grape".to_string(), vec![1.0, 0.0, 1.0]),
    ]
}

/// Strip a leading `--config <path>` from the argument vector
/// Usage: annvec [--config <path>] ...
pub fn split_config_flag(args: &[String]) -> Result<(Option<String>, Vec<String>), String> {
    if args.get(1).map(String::as_str) != Some("--config") {
        return Ok((None, args.to_vec()));
    }

    let path = match args.get(2) {
        Some(path) if !path.starts_with("--") => path.clone(),
        _ => return Err("'--config' requires a file path. Usage: annvec --config <path> ...".to_string()),
    };

    let rest = args[..1].iter().chain(&args[3..]).cloned().collect();
    Ok((Some(path), rest))
}

/// Engine settings from the `[engine]` table of a TOML file, or the defaults
pub fn engine_config(config_path: Option<&str>) -> Result<EngineConfig, VecError> {
    match config_path {
        Some(path) => Ok(Config::load(path)?.engine),
        None => Ok(EngineConfig::default()),
    }
}

/// Open the snapshot at `db_path`, or start an empty engine when there is none.
/// A saved snapshot carries its own config, so `config_path` only shapes new ones.
pub fn open_engine(db_path: &str, config_path: Option<&str>) -> Result<QueryEngine, VecError> {
    if Path::new(db_path).exists() {
        if let Some(path) = config_path {
            tracing::warn!(config = path, snapshot = db_path, "snapshot exists, ignoring config file");
        }
        return QueryEngine::load(db_path);
    }
    QueryEngine::new(engine_config(config_path)?)
}

/// Parse a command from a provided argument vector
/// This is used both for command-line args and REPL input
pub fn parse_command_from_args(args: &[String]) -> Result<Command, String> {
    if args.len() < 2 {
        return Err("No command provided. Use: insert, search, get, list, count, demo, save, load".to_string());
    }

    let command = &args[1];

    match command.as_str() {
        "insert" => parse_insert(args),
        "search" => parse_search(args),
        "get" => parse_get(args),
        "list" => Ok(Command::List),
        "count" => Ok(Command::Count),
        "demo" => Ok(Command::Demo),
        "save" => parse_path(args, "save").map(|path| Command::Save { path }),
        "load" => parse_path(args, "load").map(|path| Command::Load { path }),
        _ => Err(format!("Unknown command: {}. Available: insert, search, get, list, count, demo, save, load", command)),
    }
}

fn parse_id(raw: &str) -> Result<RecordId, String> {
    raw.parse::<RecordId>()
        .map_err(|_| format!("Invalid id: '{}'. Must be an integer.", raw))
}

fn parse_vector(raw: &[String]) -> Result<Vec<f32>, String> {
    raw.iter()
        .map(|s| s.parse::<f32>())
        .collect::<Result<Vec<f32>, _>>()
        .map_err(|_| "Failed to parse vector components as numbers".to_string())
}

/// Parse the 'insert' command
/// Usage: annvec insert <id> <label> <v1> <v2> ...
/// Underscores in the label become spaces.
fn parse_insert(args: &[String]) -> Result<Command, String> {
    if args.len() < 5 {
        return Err("'insert' command requires an ID, a label and a vector. Usage: insert <id> <label> <v1> <v2> ...".to_string());
    }

    let id = parse_id(&args[2])?;
    let label = args[3].replace('_', " ");
    let vec = parse_vector(&args[4..])?;

    Ok(Command::Insert { id, label, vec })
}

/// Parse the 'search' command
/// Usage: annvec search <v1> <v2> ... [--k <number>]
fn parse_search(args: &[String]) -> Result<Command, String> {
    if args.len() < 3 {
        return Err("'search' command requires at least one vector component. Usage: search <v1> <v2> ... [--k <number>]".to_string());
    }

    let mut k = DEFAULT_K;
    let mut vector_end = args.len();

    if args.len() >= 4 && args[args.len() - 2] == "--k" {
        match args[args.len() - 1].parse::<usize>() {
            Ok(value) => {
                k = value;
                vector_end = args.len() - 2;
            }
            Err(_) => {
                return Err(format!("Invalid --k value: '{}'. Must be a positive integer.", args[args.len() - 1]));
            }
        }
    }

    let vec = parse_vector(&args[2..vector_end])?;
    if vec.is_empty() {
        return Err("Search vector cannot be empty".to_string());
    }

    Ok(Command::Search { vec, k })
}

/// Parse the 'get' command
/// Usage: annvec get <id>
fn parse_get(args: &[String]) -> Result<Command, String> {
    if args.len() < 3 {
        return Err("'get' command requires an ID. Usage: get <id>".to_string());
    }

    Ok(Command::Get { id: parse_id(&args[2])? })
}

fn parse_path(args: &[String], name: &str) -> Result<String, String> {
    if args.len() < 3 {
        return Err(format!("'{}' command requires a file path. Usage: {} <path>", name, name));
    }
    Ok(args[2].clone())
}

/// REPL mode - interactive session over an in-memory engine
pub fn run_repl(engine: &mut QueryEngine) {
    println!("annvec - Vector Similarity Index (dimension {})", engine.dimension());
    println!("Type 'help' for commands, 'exit' or 'quit' to quit\n");

    loop {
        print!("annvec> ");
        let _ = io::stdout().flush();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                continue;
            }
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if input == "exit" || input == "quit" {
            println!("Goodbye!");
            break;
        }

        if input == "help" {
            print_help();
            continue;
        }

        let mut args: Vec<String> = vec!["annvec".to_string()];
        args.extend(input.split_whitespace().map(|s| s.to_string()));

        let command = match parse_command_from_args(&args) {
            Ok(cmd) => cmd,
            Err(error) => {
                eprintln!("Error: {}", error);
                continue;
            }
        };

        execute_command(engine, command);
    }
}

/// Single-command mode - load snapshot from path, execute command, save back
/// Usage: annvec [--config <path>] <db_path> <command> [args...]
pub fn run_single_command(args: &[String], config_path: Option<&str>) {
    if args.len() < 3 {
        eprintln!("Usage: annvec [--config <path>] <db_path> <command> [args...]");
        std::process::exit(1);
    }

    let db_path = &args[1];

    let mut engine = match open_engine(db_path, config_path) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error loading '{}': {}", db_path, e);
            std::process::exit(1);
        }
    };

    // Rebuild args: shift so args[1] becomes the command
    let shifted_args: Vec<String> = std::iter::once(args[0].clone())
        .chain(args[2..].iter().cloned())
        .collect();

    let command = match parse_command_from_args(&shifted_args) {
        Ok(cmd) => cmd,
        Err(error) => {
            eprintln!("Error: {}", error);
            std::process::exit(1);
        }
    };

    execute_command(&mut engine, command);

    if let Err(e) = engine.save(db_path) {
        eprintln!("Error saving '{}': {}", db_path, e);
        std::process::exit(1);
    }
}

fn execute_command(engine: &mut QueryEngine, command: Command) {
    match command {
        Command::Get { id } => {
            match engine.get(id) {
                Ok(record) => println!("ID: {}, Description: {}, Vector: {:?}", record.id, record.label, record.vector),
                Err(error) => eprintln!("Error: {}", error),
            }
        }

        Command::List => {
            let records = engine.records();
            if records.is_empty() {
                println!("Index is empty");
            } else {
                println!("Stored records:");
                for record in &records {
                    println!("  {}: {} {:?}", record.id, record.label, record.vector);
                }
                println!("Total: {} records", records.len());
            }
        }

        Command::Count => println!("{}", engine.len()),

        Command::Insert { id, label, vec } => {
            match engine.insert(id, label, vec) {
                Ok(()) => println!("Inserted record {}", id),
                Err(error) => eprintln!("Error: {}", error),
            }
        }

        Command::Demo => {
            match engine.extend(demo_records()) {
                Ok(count) => println!("Inserted {} demo records", count),
                Err(error) => eprintln!("Error: {}", error),
            }
        }

        Command::Search { vec, k } => {
            match engine.similarity_search(&vec, k) {
                Ok(results) => {
                    if results.is_empty() {
                        println!("No results found");
                    } else {
                        println!("Top {} most similar items:", results.len());
                        for hit in &results {
                            println!("ID: {}, Description: {}, Distance: {:.4}",
                                hit.id, hit.label, hit.distance);
                        }
                    }
                }
                Err(error) => eprintln!("Error: {}", error),
            }
        }

        Command::Save { path } => {
            match engine.save(&path) {
                Ok(()) => println!("Index saved to '{}'", path),
                Err(error) => eprintln!("Error: {}", error),
            }
        }

        Command::Load { path } => {
            match QueryEngine::load(&path) {
                Ok(loaded) => {
                    let count = loaded.len();
                    *engine = loaded;
                    println!("Index loaded from '{}' ({} records)", path, count);
                }
                Err(error) => eprintln!("Error: {}", error),
            }
        }
    }
}

fn print_help() {
    println!("Available commands:");
    println!("  insert <id> <label> <v1> <v2> ... - Insert a labeled vector (_ in label = space)");
    println!("  search <v1> <v2> ... [--k N]      - Top-k similarity search (default k=3)");
    println!("  get <id>                          - Retrieve a record by ID");
    println!("  list                              - List all records");
    println!("  count                             - Show record count");
    println!("  demo                              - Load the five fruit records");
    println!("  save <path>                       - Save index to file");
    println!("  load <path>                       - Load index from file");
    println!("  help                              - Show this help");
    println!("  exit, quit                        - Exit the program");
}
