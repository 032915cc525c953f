use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::path::PathBuf;
use tasklist::{DEFAULT_BASE_URL, HttpTaskSource, SqliteContext, Task, TaskDraft, TaskError, TaskListController};
use uuid::Uuid;

type Controller = TaskListController<SqliteContext, HttpTaskSource>;

#[derive(Parser)]
#[command(name = "tasklist")]
#[command(about = "TaskList CLI - local task list seeded once from a remote service")]
#[command(version)]
struct Cli {
    /// Directory holding the store (default: platform data dir)
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    /// Base URL of the remote task service
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import tasks from the remote service if this store was never seeded
    Sync,

    /// List tasks, optionally filtered by a search query
    List {
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Create a task
    Add {
        name: String,
        #[arg(short, long)]
        details: Option<String>,
    },

    /// Flip a task's completion flag
    Toggle { id: String },

    /// Change a task's name or details
    Edit {
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        details: Option<String>,
        /// Remove the task's details
        #[arg(long, conflicts_with = "details")]
        clear_details: bool,
    },

    /// Delete a task
    Remove { id: String },

    /// Print a task as share text
    Share { id: String },
}

fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let store_path = cli.store_path.unwrap_or_else(default_store_path);
    let context = SqliteContext::open(&store_path)?;
    let mut controller = TaskListController::new(context, HttpTaskSource::new(&cli.base_url));

    match cli.command {
        Commands::Sync => {
            let mut failure = None;
            controller.sync_if_needed(|e| failure = Some(e));
            if let Some(e) = failure {
                return Err(report(e, "Could not initialize tasks from the network"));
            }
            println!("Sync complete");
        }
        Commands::List { query } => {
            controller.sync_if_needed(|e| {
                eprintln!("{} could not initialize tasks from the network: {}", "warning:".yellow(), e);
            });
            load(&mut controller)?;

            if let Some(query) = query.as_deref() {
                controller.filter(Some(query));
                controller.set_filter_active(true);
            }

            let tasks = controller.visible_tasks();
            for task in &tasks {
                print_task(task);
            }
            println!("{} tasks", tasks.len());
        }
        Commands::Add { name, details } => {
            load(&mut controller)?;

            let mut draft = TaskDraft::new(name).persist();
            if let Some(details) = details {
                draft = draft.details(details);
            }
            let task = controller.store().create(draft);
            print_task(&task);
            controller.add(task);
        }
        Commands::Toggle { id } => {
            load(&mut controller)?;
            let id = resolve_id(&controller, &id)?;

            controller.toggle_completion(id);
            if let Some(task) = controller.find(id) {
                print_task(task);
            }
        }
        Commands::Edit {
            id,
            name,
            details,
            clear_details,
        } => {
            load(&mut controller)?;
            let id = resolve_id(&controller, &id)?;
            let current = controller.find(id).cloned().ok_or_else(|| eyre!("Task {} not found", id))?;

            let name = name.unwrap_or(current.name);
            let details = edited_details(details, clear_details, current.details);

            let mut failure = None;
            let changed = controller.edit(id, &name, details.as_deref(), |e| failure = Some(e));
            if let Some(e) = failure {
                return Err(report(e, "Could not save task"));
            }
            if !changed {
                println!("Nothing to change");
            }
            if let Some(task) = controller.find(id) {
                print_task(task);
            }
        }
        Commands::Remove { id } => {
            load(&mut controller)?;
            let id = resolve_id(&controller, &id)?;

            controller.remove(id);
            println!("Removed {}", id);
        }
        Commands::Share { id } => {
            load(&mut controller)?;
            let id = resolve_id(&controller, &id)?;

            if let Some(task) = controller.find(id) {
                println!("{}", task.share_text());
            }
        }
    }

    Ok(())
}

fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("tasklist"))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn report(error: TaskError, message: &'static str) -> eyre::Report {
    eyre::Report::new(error).wrap_err(message)
}

fn load(controller: &mut Controller) -> Result<()> {
    let mut failure = None;
    controller.load(|e| failure = Some(e));
    match failure {
        Some(e) => Err(report(e, "Could not load tasks from the store")),
        None => Ok(()),
    }
}

/// Accept a full id or any unique prefix of one; the task must be loaded
fn resolve_id(controller: &Controller, input: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(input) {
        return match controller.find(id) {
            Some(_) => Ok(id),
            None => Err(eyre!("No task with id {}", id)),
        };
    }

    let matches: Vec<Uuid> = controller
        .all_tasks()
        .iter()
        .map(|t| t.id)
        .filter(|id| id.to_string().starts_with(input))
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(eyre!("No task matches id {}", input)),
        _ => Err(eyre!("Id prefix {} is ambiguous ({} tasks)", input, matches.len())),
    }
}

fn edited_details(requested: Option<String>, clear: bool, current: Option<String>) -> Option<String> {
    if clear { None } else { requested.or(current) }
}

fn print_task(task: &Task) {
    let mark = if task.is_completed {
        "[x]".green()
    } else {
        "[ ]".normal()
    };
    let name = if task.is_completed {
        task.name.strikethrough().dimmed()
    } else {
        task.name.bold()
    };
    let created = task.created_at.with_timezone(&chrono::Local).format("%d/%m/%y");

    println!("{} {} {} {}", mark, task.id, name, created.to_string().dimmed());
    if let Some(details) = &task.details {
        println!("    {}", details.dimmed());
    }
}
