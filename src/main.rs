use massact::{
    MassactError, Result,
    cli::{Cli, Commands, CourseCommands, ItemCommands, TaskCommands, target_section},
    commands::{self, Session, actions},
    config::MassactConfig,
    db::Database,
};
use tracing_subscriber::{EnvFilter, fmt};

fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the stderr tracing subscriber; `RUST_LOG` overrides `-v`
fn init_logging(verbose: u8) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level(verbose)));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn dispatch(session: &Session<'_>, command: &Commands) -> Result<()> {
    match command {
        Commands::Course { command } => match command {
            CourseCommands::Create { name, sections } => {
                commands::course::create(session, name, *sections)
            }
            CourseCommands::List => commands::course::list_courses(session),
        },
        Commands::Item {
            command:
                ItemCommands::Add {
                    course,
                    section,
                    kind,
                    name,
                },
        } => commands::course::add_item(session, *course, *section, kind, name),
        Commands::List { course } => commands::course::show(session, *course),
        Commands::Duplicate {
            selection,
            section,
            defer,
        } => actions::duplicate(session, &selection.items, *section, *defer),
        Commands::CopyTo {
            target,
            selection,
            section,
        } => actions::copy_to(session, *target, &selection.items, target_section(*section)),
        Commands::Move { selection, section } => {
            actions::move_to(session, &selection.items, *section)
        }
        Commands::Delete { selection, yes } => actions::delete(session, &selection.items, *yes),
        Commands::Visibility { mode, selection } => {
            let (visible, on_page) = mode.flags();
            actions::visibility(session, &selection.items, visible, on_page)
        }
        Commands::Indent { selection } => actions::indent(session, &selection.items, 1),
        Commands::Outdent { selection } => actions::indent(session, &selection.items, -1),
        Commands::Description { hide, selection } => {
            actions::description(session, &selection.items, !*hide)
        }
        Commands::Notify { selection } => actions::notify(session, &selection.items),
        Commands::Tasks { command } => match command {
            TaskCommands::List => commands::tasks::list(session),
            TaskCommands::Run { id } => commands::tasks::run(session, *id),
        },
        Commands::Events { course } => commands::tasks::events(session, *course),
        Commands::Db { .. } | Commands::Config { .. } => Err(MassactError::InvalidInput(
            "command does not operate on a database".into(),
        )),
    }
}

/// Main entry point for the massact application
///
/// Loads configuration, parses command-line arguments, and dispatches to the
/// appropriate command handler.
///
/// # Errors
///
/// Returns `MassactError` if configuration loading fails, the database cannot
/// be opened, or any command handler returns an error.
fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    let config = MassactConfig::load_or_setup()?;
    let quiet = cli.quiet || config.quiet;

    match &cli.command {
        Commands::Db { command } => commands::db::execute(config, command, quiet),
        Commands::Config { command } => commands::config::execute(config, command, quiet),
        command => {
            let db_path = config.resolve_database(cli.db.as_deref()).map_err(|e| {
                MassactError::InvalidInput(format!(
                    "{e}. Use 'massact db add <name> <path>' to create one, or specify --db <name>."
                ))
            })?;
            let db = Database::open(db_path)?;
            tracing::debug!(path = %db_path.display(), "database opened");
            let session = Session::new(&db, &config, quiet, cli.json);
            dispatch(&session, command)
        }
    }
}
