//! Command-line interface definitions and parsing
//!
//! This module defines the CLI structure for massact using the `clap` crate.
//!
//! # Commands
//!
//! - **course** / **item**: populate the store
//! - **list**: show a course with module ids and selectability
//! - **duplicate**, **copy-to**, **move**, **delete**, **visibility**,
//!   **indent**, **outdent**, **description**, **notify**: bulk actions
//! - **tasks**, **events**: deferred work and the event log
//! - **db**, **config**: manage databases and settings
//!
//! Bulk actions take module ids and work on one course at a time.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::bulk::TargetSection;
use crate::course::{CourseId, ItemId, SectionNum};

/// Visibility requested for the selected modules
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityMode {
    /// Visible on the course page
    Show,
    /// Hidden from students
    Hide,
    /// Available through links but not shown on the course page
    Stealth,
}

impl VisibilityMode {
    /// `(visible, visible_on_page)` flags for the executor
    #[must_use]
    pub const fn flags(self) -> (bool, bool) {
        match self {
            Self::Show => (true, true),
            Self::Hide => (false, true),
            Self::Stealth => (true, false),
        }
    }
}

/// Modules a bulk action applies to
#[derive(Args, Debug, Clone)]
pub struct Selection {
    /// Module ids (all from the same course)
    #[arg(value_name = "ID", required = true, num_args = 1..)]
    pub items: Vec<ItemId>,
}

#[derive(Parser, Debug)]
#[command(name = "massact")]
#[command(about = "Bulk actions on course modules", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Suppress informational output (only print results)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print outcomes as JSON
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Use a specific database instead of the default
    #[arg(long = "db", value_name = "NAME", global = true)]
    pub db: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage courses
    Course {
        #[command(subcommand)]
        command: CourseCommands,
    },

    /// Manage modules
    Item {
        #[command(subcommand)]
        command: ItemCommands,
    },

    /// Show the modules of a course in display order
    #[command(visible_alias = "ls")]
    List {
        course: CourseId,
    },

    /// Duplicate modules inside their course
    #[command(visible_alias = "dup")]
    Duplicate {
        #[command(flatten)]
        selection: Selection,

        /// Put every copy at the end of this section
        #[arg(short = 's', long = "section")]
        section: Option<SectionNum>,

        /// Queue the duplication instead of running it now
        #[arg(long = "defer")]
        defer: bool,
    },

    /// Duplicate modules into another course
    #[command(name = "copy-to")]
    CopyTo {
        /// Target course id
        target: CourseId,

        #[command(flatten)]
        selection: Selection,

        /// Put every copy in this section (default: keep section numbers)
        #[arg(short = 's', long = "section")]
        section: Option<SectionNum>,
    },

    /// Move modules to the end of a section
    #[command(visible_alias = "mv")]
    Move {
        #[command(flatten)]
        selection: Selection,

        /// Destination section
        #[arg(short = 's', long = "section")]
        section: SectionNum,
    },

    /// Delete modules
    #[command(visible_alias = "rm")]
    Delete {
        #[command(flatten)]
        selection: Selection,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },

    /// Change availability of modules
    Visibility {
        #[arg(value_enum)]
        mode: VisibilityMode,

        #[command(flatten)]
        selection: Selection,
    },

    /// Indent modules one level
    Indent {
        #[command(flatten)]
        selection: Selection,
    },

    /// Outdent modules one level
    Outdent {
        #[command(flatten)]
        selection: Selection,
    },

    /// Show or hide module descriptions on the course page
    Description {
        /// Hide instead of show
        #[arg(long = "hide")]
        hide: bool,

        #[command(flatten)]
        selection: Selection,
    },

    /// Notify participants that modules changed
    Notify {
        #[command(flatten)]
        selection: Selection,
    },

    /// Inspect and run deferred tasks
    Tasks {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Show the event log
    Events {
        /// Only events of this course
        #[arg(short = 'c', long = "course")]
        course: Option<CourseId>,
    },

    /// Database management commands
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

impl Commands {
    /// Whether the command needs an open database
    #[must_use]
    pub const fn needs_database(&self) -> bool {
        !matches!(self, Self::Db { .. } | Self::Config { .. })
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CourseCommands {
    /// Create a course
    Create {
        name: String,

        /// Number of the last section (section 0 always exists)
        #[arg(short = 's', long = "sections", default_value_t = 1)]
        sections: SectionNum,
    },

    /// List all courses
    #[command(visible_alias = "ls")]
    List,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ItemCommands {
    /// Add a module to the end of a section
    Add {
        course: CourseId,
        section: SectionNum,
        /// Module type, e.g. page, forum, label
        kind: String,
        name: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum TaskCommands {
    /// List pending tasks
    #[command(visible_alias = "ls")]
    List,

    /// Run pending tasks (all of them without an id)
    Run {
        id: Option<u64>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum DbCommands {
    /// Add a new database
    Add {
        /// Name of the database
        name: String,

        /// Path to the database directory
        path: PathBuf,
    },

    /// List all databases
    List,

    /// Remove a database from configuration
    #[command(visible_alias = "rm")]
    Remove {
        /// Name of the database to remove
        name: String,

        /// Also delete database files from disk
        #[arg(short = 'd', long = "delete-files")]
        delete_files: bool,
    },

    /// Set the default database
    #[command(name = "set-default")]
    SetDefault {
        /// Name of the database to set as default
        name: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Set a configuration value
    Set {
        /// Configuration key=value (e.g., allow_stealth=true)
        #[arg(value_name = "KEY=VALUE")]
        setting: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key to retrieve (e.g., max_sections)
        #[arg(value_name = "KEY")]
        key: String,
    },
}

impl Cli {
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Destination of a cross-course copy from the optional `--section` flag
#[must_use]
pub fn target_section(section: Option<SectionNum>) -> TargetSection {
    TargetSection::from(section)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_arguments() {
        let cli = Cli::try_parse_from(["massact", "duplicate", "4", "2", "--section", "3"]).unwrap();
        match cli.command {
            Commands::Duplicate {
                selection,
                section,
                defer,
            } => {
                assert_eq!(selection.items, vec![4, 2]);
                assert_eq!(section, Some(3));
                assert!(!defer);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_selection_is_required() {
        assert!(Cli::try_parse_from(["massact", "indent"]).is_err());
    }

    #[test]
    fn test_copy_to_defaults_to_original_sections() {
        let cli = Cli::try_parse_from(["massact", "copy-to", "9", "1"]).unwrap();
        match cli.command {
            Commands::CopyTo { target, section, .. } => {
                assert_eq!(target, 9);
                assert_eq!(target_section(section), TargetSection::PreserveSource);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["massact", "list", "1", "-vv", "--json", "--db", "work"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.json);
        assert_eq!(cli.db.as_deref(), Some("work"));
        assert!(cli.command.needs_database());
    }

    #[test]
    fn test_visibility_flags() {
        assert_eq!(VisibilityMode::Stealth.flags(), (true, false));
        assert_eq!(VisibilityMode::Hide.flags(), (false, true));
        let cli = Cli::try_parse_from(["massact", "visibility", "stealth", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Visibility {
                mode: VisibilityMode::Stealth,
                ..
            }
        ));
    }

    #[test]
    fn test_db_commands_skip_database() {
        let cli = Cli::try_parse_from(["massact", "db", "list"]).unwrap();
        assert!(!cli.command.needs_database());
    }
}
