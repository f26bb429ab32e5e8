//! Main CLI application

use crate::config::{find_project_file, load_user_defaults, load_workspace, user_defaults_path};
use crate::engine::{BuildReport, TaskState, Workspace};
use crate::logging::{init_logging, Verbosity};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use colored::Colorize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::{self, IsTerminal as _};
use std::path::PathBuf;

const BIN_NAME: &str = "plugbuild";

/// CLI application
pub struct App {
    /// Every project reachable from the project file
    workspace: Workspace,
    /// Project selected with `--project`
    project: Option<String>,
    /// Requested tasks, in command line order
    targets: Vec<String>,
    verbosity: Verbosity,
}

impl App {
    /// Load the workspace named by `--file`, or the nearest project file
    pub fn from_matches(matches: &ArgMatches) -> anyhow::Result<Self> {
        let path = match matches.get_one::<PathBuf>("file") {
            Some(path) => path.clone(),
            None => find_project_file()?,
        };
        let defaults = load_user_defaults(user_defaults_path().as_deref())?;
        let workspace = load_workspace(&path, &defaults)?;

        Ok(App {
            workspace,
            project: matches.get_one::<String>("project").cloned(),
            targets: matches
                .get_many::<String>("tasks")
                .map(|tasks| tasks.cloned().collect())
                .unwrap_or_default(),
            verbosity: get_verbosity(matches),
        })
    }

    /// Print the tasks of the selected projects
    pub fn list(&self) -> anyhow::Result<()> {
        let names = match &self.project {
            Some(name) => vec![name.clone()],
            None => self.workspace.project_names(),
        };
        for name in names {
            let project = self.workspace.project(&name)?;
            println!(
                "{} {}",
                project.name().bold(),
                format!("({})", project.plugins().join(", ")).dimmed()
            );

            let mut groups: BTreeMap<&str, Vec<(&str, &str)>> = BTreeMap::new();
            for task in project.graph.tasks() {
                groups
                    .entry(task.group.as_deref().unwrap_or("other"))
                    .or_default()
                    .push((task.name.as_str(), task.description.as_deref().unwrap_or("")));
            }
            let width = project
                .graph
                .tasks()
                .map(|task| task.name.len())
                .max()
                .unwrap_or(0);

            for (group, tasks) in groups {
                println!("  {}", group.cyan());
                for (task, description) in tasks {
                    println!("    {:width$}  {}", task.green(), description, width = width);
                }
            }
        }
        Ok(())
    }

    /// Print the execution order without running anything
    pub fn dry_run(&self) -> anyhow::Result<()> {
        for name in self.selected_projects()? {
            let plan = self.workspace.plan(&name, &self.targets)?;
            println!("{}: {}", name.bold(), plan.join(" -> "));
        }
        Ok(())
    }

    /// Run the requested tasks
    pub fn build(&self) -> anyhow::Result<()> {
        let reports = match &self.project {
            Some(name) => vec![(name.clone(), self.workspace.run(name, &self.targets)?)],
            None if self.workspace.len() == 1 => {
                let name = self.workspace.project_names().remove(0);
                let report = self.workspace.run(&name, &self.targets)?;
                vec![(name, report)]
            }
            None => self.workspace.run_all(&self.targets)?,
        };

        if reports.is_empty() {
            anyhow::bail!(
                "no project defines all of the tasks: {}",
                self.targets.join(", ")
            );
        }
        if self.verbosity >= Verbosity::Normal {
            for (name, report) in &reports {
                print_summary(name, report);
            }
        }
        Ok(())
    }

    fn selected_projects(&self) -> anyhow::Result<Vec<String>> {
        if let Some(name) = &self.project {
            return Ok(vec![name.clone()]);
        }
        let mut names = Vec::new();
        for name in self.workspace.project_names() {
            let project = self.workspace.project(&name)?;
            if self.targets.iter().all(|target| project.graph.contains(target)) {
                names.push(name);
            }
        }
        Ok(names)
    }
}

/// Build the clap command
pub fn build_command() -> Command {
    Command::new(BIN_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds portal plugin projects: themes, portlets, hooks and layouts")
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Path to the plugbuild.yml project file"),
        )
        .arg(
            Arg::new("project")
                .short('p')
                .long("project")
                .value_name("PROJECT")
                .help("Only build this project of the workspace"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print command output and errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .short('n')
                .long("dry-run")
                .help("Print the execution order without running tasks")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .help("List the tasks of every project")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("completions")
                .long("completions")
                .value_name("SHELL")
                .value_parser(value_parser!(Shell))
                .help("Print a shell completion script"),
        )
        .arg(
            Arg::new("tasks")
                .value_name("TASK")
                .num_args(0..)
                .action(ArgAction::Append)
                .help("Tasks to run"),
        )
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

fn print_summary(project: &str, report: &BuildReport) {
    for (task, state) in &report.tasks {
        let mark = match state {
            TaskState::Succeeded => "done".green(),
            TaskState::Skipped => "skipped".yellow(),
            TaskState::Failed => "failed".red(),
            TaskState::NotRun => "not run".dimmed(),
        };
        println!("{}:{} {}", project.bold(), task, mark);
    }
}

/// Run the CLI application with the process arguments
pub fn run() -> anyhow::Result<()> {
    run_from(std::env::args_os())
}

/// Run the CLI application with explicit arguments
pub fn run_from<I, T>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command().get_matches_from(args);

    if let Some(shell) = matches.get_one::<Shell>("completions").copied() {
        clap_complete::generate(shell, &mut build_command(), BIN_NAME, &mut io::stdout());
        return Ok(());
    }

    if !io::stdout().is_terminal() {
        colored::control::set_override(false);
    }
    init_logging(get_verbosity(&matches))?;

    let app = App::from_matches(&matches)?;
    if matches.get_flag("list") || app.targets.is_empty() {
        app.list()
    } else if matches.get_flag("dry-run") {
        app.dry_run()
    } else {
        app.build()
    }
}
