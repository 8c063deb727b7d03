use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use task_tracker::config::{Config, DateInput, Overrides};
use task_tracker::date::{parse_date, validate_due_date};
use task_tracker::{Clock, DateError, NewTask, Status, TaskPatch, TaskStore};
use tracing::debug;

const INVALID_DUE_DATE: &str = "Invalid due date format. Use YYYY-MM-DD";

/// Simple task tracker
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to JSON data file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Fail on a malformed data file instead of treating it as empty
    #[arg(long, global = true)]
    strict: bool,

    /// Log more; repeat for more detail
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
enum Commands {
    /// List all tasks
    List {
        /// Only show tasks with this status (todo, in-progress, done)
        #[arg(long)]
        status: Option<String>,
    },
    /// Add a task
    Add {
        title: String,
        /// Task description
        #[arg(long, default_value = "")]
        desc: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Initial status (todo, in-progress, done)
        #[arg(long, default_value_t = Status::Todo)]
        status: Status,
    },
    /// Get task by id
    Get { id: u64 },
    /// Update task by id
    Update {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        done: Option<bool>,
        #[arg(long)]
        status: Option<Status>,
        /// Due date (YYYY-MM-DD); pass "" to clear it
        #[arg(long)]
        due: Option<String>,
    },
    /// Delete task by id
    Delete { id: u64 },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&Overrides {
        db_path: cli.db.clone(),
        strict: cli.strict,
    })?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(config.log_level(cli.verbose)?)
        .init();
    debug!(?config, "Loaded configuration");

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let store = TaskStore::new(&config.db_path).with_policy(config.load_policy);
    run(&store, config.date_input, command)
}

fn run<C: Clock>(
    store: &TaskStore<C>,
    date_input: DateInput,
    command: Commands,
) -> anyhow::Result<()> {
    match command {
        Commands::List { status: Some(status) } => {
            let tasks = store.list_by_status(&status)?;
            println!("Tasks with status '{}': {}", status, tasks.len());
            print_json(&tasks)?;
        }
        Commands::List { status: None } => {
            print_json(&store.list()?)?;
        }
        Commands::Add {
            title,
            desc,
            due,
            status,
        } => {
            let mut new_task = NewTask::new(title).description(desc).status(status);
            if let Some(due) = due {
                let due_date = resolve_due_date(&due, date_input).context(INVALID_DUE_DATE)?;
                new_task = new_task.due_date(due_date);
            }
            let task = store.create(new_task).context("Failed to create task")?;
            println!("Created: {}", serde_json::to_string_pretty(&task)?);
        }
        Commands::Get { id } => match store.get(id)? {
            Some(task) => print_json(&task)?,
            None => println!("Not found"),
        },
        Commands::Update {
            id,
            title,
            desc,
            done,
            status,
            due,
        } => {
            let due_date = due
                .map(|due| resolve_due_date(&due, date_input))
                .transpose()
                .context(INVALID_DUE_DATE)?;
            let patch = TaskPatch {
                title,
                description: desc,
                done,
                status,
                due_date,
            };
            match store
                .update(id, &patch)
                .with_context(|| format!("Failed to update task {id}"))?
            {
                Some(task) => print_json(&task)?,
                None => println!("Not found"),
            }
        }
        Commands::Delete { id } => {
            let deleted = store
                .delete(id)
                .with_context(|| format!("Failed to delete task {id}"))?;
            println!("{}", if deleted { "Deleted" } else { "Not found" });
        }
    }
    Ok(())
}

/// Turns a `--due` value into what gets stored. An empty value clears the date.
fn resolve_due_date(text: &str, mode: DateInput) -> Result<String, DateError> {
    if text.is_empty() {
        return Ok(String::new());
    }
    match mode {
        DateInput::Strict => validate_due_date(text).map(|_| text.to_string()),
        DateInput::Lenient => parse_date(text).map(Option::unwrap_or_default),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
