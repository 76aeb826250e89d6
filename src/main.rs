use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use taskboard::config::ConfigError;
use taskboard::{
    ApiError, Board, BoardId, ClientConfig, NewTask, Pipeline, Resource, Settlement, StatusKind, Store,
    TaskField, TaskId, TaskStatus,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("client setup failed: {0}")]
    Setup(#[from] ApiError),
    #[error("{resource} request failed: {message}")]
    Failed { resource: &'static str, message: String },
    #[error("nothing to edit; pass --title, --status or --description")]
    NothingToEdit,
}

#[derive(Parser, Debug)]
#[command(name = "taskboard", about = "Task board client")]
struct Cli {
    #[arg(long, env = "TASKBOARD_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every board.
    Boards,
    /// Show one board with its three status columns.
    Show { board_id: BoardId },
    CreateBoard { title: String },
    RenameBoard { board_id: BoardId, title: String },
    DeleteBoard { board_id: BoardId },
    CreateTask {
        board_id: BoardId,
        title: String,
        #[arg(long, default_value = "TODO")]
        status: TaskStatus,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Edit any combination of fields; each goes through its own endpoint.
    EditTask {
        task_id: TaskId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        description: Option<String>,
    },
    MoveTask { task_id: TaskId, board_id: BoardId },
    DeleteTask { task_id: TaskId },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_lookup(|key| match key {
        "TASKBOARD_API_URL" if cli.api_url.is_some() => cli.api_url.clone(),
        _ => std::env::var(key).ok(),
    })?;
    tracing::debug!(api_url = %config.api_url, "taskboard starting");

    let pipeline = Pipeline::connect(&config)?;
    run(&pipeline, cli.command).await
}

async fn run(pipeline: &Pipeline, command: Command) -> Result<(), CliError> {
    // Every command starts from the server's view.
    check(pipeline.fetch_boards().await, Resource::Boards)?;

    let shown = match command {
        Command::Boards => None,
        Command::Show { board_id } => {
            check(pipeline.select_board(board_id).await, Resource::BoardDetail)?;
            Some(board_id)
        }
        Command::CreateBoard { title } => {
            check(pipeline.create_board(&title).await, Resource::BoardDetail)?;
            None
        }
        Command::RenameBoard { board_id, title } => {
            check(pipeline.rename_board(board_id, &title).await, Resource::BoardDetail)?;
            Some(board_id)
        }
        Command::DeleteBoard { board_id } => {
            check(pipeline.delete_board(board_id).await, Resource::BoardDetail)?;
            None
        }
        Command::CreateTask { board_id, title, status, description } => {
            let new_task = NewTask { title, board_id, status, description };
            check(pipeline.create_task(new_task).await, Resource::TaskMutation)?;
            Some(board_id)
        }
        Command::EditTask { task_id, title, status, description } => {
            let fields: Vec<TaskField> = [
                title.map(TaskField::Title),
                status.map(TaskField::Status),
                description.map(TaskField::Description),
            ]
            .into_iter()
            .flatten()
            .collect();
            if fields.is_empty() {
                return Err(CliError::NothingToEdit);
            }
            for field in fields {
                check(pipeline.edit_task(task_id, field).await, Resource::TaskMutation)?;
            }
            owning_board(pipeline, task_id).await
        }
        Command::MoveTask { task_id, board_id } => {
            check(pipeline.move_task(task_id, board_id).await, Resource::TaskMutation)?;
            Some(board_id)
        }
        Command::DeleteTask { task_id } => {
            let board_id = owning_board(pipeline, task_id).await;
            check(pipeline.delete_task(task_id).await, Resource::TaskMutation)?;
            board_id
        }
    };

    let store = pipeline.store();
    let store = store.read().await;
    match shown.and_then(|id| store.board(id)) {
        Some(board) => print_board(board),
        None => print_boards(&store),
    }
    print_statuses(&store);
    Ok(())
}

fn check(settlement: Settlement, resource: Resource) -> Result<(), CliError> {
    match settlement {
        Settlement::Failed(e) => Err(CliError::Failed { resource: resource.as_str(), message: e.to_string() }),
        Settlement::Succeeded | Settlement::Superseded => Ok(()),
    }
}

async fn owning_board(pipeline: &Pipeline, task_id: TaskId) -> Option<BoardId> {
    pipeline.store().read().await.task(task_id).map(|t| t.board_id)
}

fn print_boards(store: &Store) {
    if store.boards().is_empty() {
        println!("no boards");
        return;
    }
    for board in store.boards() {
        println!("#{:<6} {} ({} tasks)", board.id, board.title, board.tasks.len());
    }
}

fn print_board(board: &Board) {
    println!("#{} {}", board.id, board.title);
    for status in TaskStatus::ALL {
        println!();
        println!("  {status}");
        let column = board.tasks_with_status(status);
        if column.is_empty() {
            println!("    -");
        }
        for task in column {
            if task.description.is_empty() {
                println!("    #{:<6} {}", task.id, task.title);
            } else {
                println!("    #{:<6} {}: {}", task.id, task.title, task.description);
            }
        }
    }
}

fn print_statuses(store: &Store) {
    for resource in Resource::ALL {
        let status = store.status(resource);
        if status.kind == StatusKind::Idle {
            continue;
        }
        match &status.error {
            Some(error) => eprintln!("{}: {:?} ({error})", resource.as_str(), status.kind),
            None => eprintln!("{}: {:?}", resource.as_str(), status.kind),
        }
    }
}
