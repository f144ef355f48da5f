//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use termtree::Tree;
use tracing::{debug, instrument};

use crate::application::example::hominoidea;
use crate::application::layout::{compute_layout, ScaleMode};
use crate::application::TreeEditor;
use crate::cli::args::{Cli, Commands, ConfigCommands, LayoutArgs, NewSpeciesArgs};
use crate::cli::output::{self, format_time};
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{SpeciesDraft, SpeciesRef};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute(cli: &Cli) -> CliResult<()> {
    if let Commands::Completion { shell } = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let project_dir = project_dir(cli)?;
    let settings = Settings::load(Some(&project_dir))?;
    let container = ServiceContainer::new(settings);

    match &cli.command {
        Commands::Show { file } => cmd_show(&container, file),
        Commands::Order { file, present_time } => cmd_order(&container, file, *present_time),
        Commands::Layout { file, options } => cmd_layout(&container, file, options),
        Commands::Stats { file } => cmd_stats(&container, file),
        Commands::Validate { file } => cmd_validate(&container, file),
        Commands::AddDescendant {
            file,
            parent,
            species,
            after,
        } => cmd_add_descendant(&container, file, parent, species, *after),
        Commands::AddAncestor {
            file,
            child,
            species,
            before,
        } => cmd_add_ancestor(&container, file, child, species, *before),
        Commands::Remove { file, name } => cmd_remove(&container, file, name),
        Commands::Reroot { file, name } => cmd_reroot(&container, file, name),
        Commands::Example { output } => cmd_example(&container, output.as_deref()),
        Commands::Config { command } => cmd_config(&container, &project_dir, command),
        Commands::Completion { .. } => Ok(()),
    }
}

fn project_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.project_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir()
            .map_err(|e| CliError::Infra(InfraError::io("resolve current directory", e))),
    }
}

fn interval(sp: SpeciesRef<'_>, decimals: usize) -> String {
    format!(
        "[{} .. {}]",
        format_time(sp.apparition(), decimals),
        format_time(sp.extinction(), decimals)
    )
}

fn label(sp: SpeciesRef<'_>) -> String {
    if sp.is_displayed() {
        sp.name().to_string()
    } else {
        format!("({})", if sp.name().is_empty() { "hidden" } else { sp.name() })
    }
}

fn species_tree(sp: SpeciesRef<'_>, decimals: usize) -> Tree<String> {
    Tree::new(format!("{} {}", label(sp), interval(sp, decimals)))
        .with_leaves(sp.descendants().map(|d| species_tree(d, decimals)))
}

#[instrument(skip(container))]
fn cmd_show(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let editor = container.documents.load(file)?;
    let root = editor.root()?;
    output::info(&species_tree(root, container.settings.output.decimals));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_order(container: &ServiceContainer, file: &Path, present_time: Option<f64>) -> CliResult<()> {
    let editor = container.documents.load(file)?;
    let root = editor.root()?;
    let decimals = container.settings.output.decimals;
    let present_time = present_time.or(container.settings.layout.present_time);

    let rows = root
        .all_descendants()
        .into_iter()
        .filter_map(|id| editor.arena().species(id))
        .filter(|sp| present_time.map_or(true, |t| sp.apparition() < t));
    for (row, sp) in rows.enumerate() {
        output::info(&format!("{:>4}  {} {}", row, label(sp), interval(sp, decimals)));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_layout(container: &ServiceContainer, file: &Path, args: &LayoutArgs) -> CliResult<()> {
    let editor = container.documents.load(file)?;
    let root = editor.root()?;

    let mut options = container.settings.layout.to_options();
    if args.steps {
        options.scale = ScaleMode::Steps;
    }
    if let Some(width) = args.width {
        options.width = width;
    }
    if let Some(row_height) = args.row_height {
        options.row_height = row_height;
    }
    if args.present_time.is_some() {
        options.present_time = args.present_time;
    }
    if !(options.width > 0.0 && options.row_height > 0.0) {
        return Err(CliError::InvalidArgs(
            "width and row height must be positive".to_string(),
        ));
    }
    debug!("layout options: {:?}", options);

    let layout = compute_layout(root, &options);
    output::header(&format!(
        "{:.1} x {:.1} ({:?}, {} per unit)",
        layout.width,
        layout.height,
        options.scale,
        format_time(layout.scale_x, container.settings.output.decimals)
    ));
    for row in &layout.rows {
        let name = editor.arena().species(row.id).map(label).unwrap_or_default();
        output::info(&format!(
            "{:>4}  y={:<8.1} start={:<8.1} branch={:<8.1} end={:<8.1} {}",
            row.row, row.y, row.x_start, row.x_branch, row.x_end, name
        ));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_stats(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let editor = container.documents.load(file)?;
    let root = editor.root()?;
    let decimals = container.settings.output.decimals;

    output::header(&label(root));
    output::detail(&format!("species:             {}", root.subtree_len()));
    output::detail(&format!(
        "leaves:              {}",
        root.iter_subtree().filter(|sp| sp.is_leaf()).count()
    ));
    output::detail(&format!(
        "apparition:          {}",
        format_time(root.apparition(), decimals)
    ));
    output::detail(&format!(
        "absolute extinction: {}",
        format_time(root.absolute_extinction(), decimals)
    ));
    output::detail(&format!(
        "absolute duration:   {}",
        format_time(root.absolute_duration(), decimals)
    ));
    output::detail(&format!(
        "generations:         {}",
        root.steps_until_last_descendant(false)
    ));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_validate(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let editor = container.documents.load(file)?;
    let root = editor.root()?;
    output::success(&format!(
        "{}: {} species, valid",
        file.display(),
        root.subtree_len()
    ));
    Ok(())
}

fn draft(args: &NewSpeciesArgs, offset: f64) -> SpeciesDraft {
    let mut draft = SpeciesDraft::new(args.name.as_str(), offset, args.duration);
    draft.description = args.description.clone();
    draft.image = args.image.clone();
    draft
}

fn save(container: &ServiceContainer, file: &Path, editor: &TreeEditor) -> CliResult<()> {
    container
        .documents
        .save(file, editor.root()?, container.settings.output.pretty)?;
    Ok(())
}

#[instrument(skip(container, species))]
fn cmd_add_descendant(
    container: &ServiceContainer,
    file: &Path,
    parent: &str,
    species: &NewSpeciesArgs,
    after: f64,
) -> CliResult<()> {
    let mut editor = container.documents.load(file)?;
    let parent_id = editor.find(parent)?;
    editor.create_descendant(parent_id, draft(species, after))?;
    save(container, file, &editor)?;
    output::action("Added", &format!("{} below {}", species.name, parent));
    Ok(())
}

#[instrument(skip(container, species))]
fn cmd_add_ancestor(
    container: &ServiceContainer,
    file: &Path,
    child: &str,
    species: &NewSpeciesArgs,
    before: f64,
) -> CliResult<()> {
    let mut editor = container.documents.load(file)?;
    let child_id = editor.find(child)?;
    editor.create_ancestor(child_id, draft(species, before))?;
    save(container, file, &editor)?;
    output::action("Added", &format!("{} above {}", species.name, child));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_remove(container: &ServiceContainer, file: &Path, name: &str) -> CliResult<()> {
    let mut editor = container.documents.load(file)?;
    let id = editor.find(name)?;
    if editor.root()?.id() == id {
        return Err(CliError::Usage(format!(
            "{name} is the root of the tree; delete the document instead"
        )));
    }
    editor.delete_species(id)?;
    save(container, file, &editor)?;
    output::action("Removed", name);
    Ok(())
}

#[instrument(skip(container))]
fn cmd_reroot(container: &ServiceContainer, file: &Path, name: &str) -> CliResult<()> {
    let mut editor = container.documents.load(file)?;
    let id = editor.find(name)?;
    editor.delete_ancestor(id)?;
    save(container, file, &editor)?;
    output::action("Rerooted", name);
    Ok(())
}

#[instrument(skip(container))]
fn cmd_example(container: &ServiceContainer, output_path: Option<&Path>) -> CliResult<()> {
    let editor = TreeEditor::from_json(&hominoidea()?)?;
    match output_path {
        Some(path) => {
            save(container, path, &editor)?;
            output::action("Wrote", &path.display());
        }
        None => {
            let text = editor
                .root()?
                .to_json_string(container.settings.output.pretty)?;
            output::info(&text);
        }
    }
    Ok(())
}

fn cmd_config(container: &ServiceContainer, project_dir: &Path, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let marker = |path: &Path| if path.exists() { "" } else { " (missing)" };
            match global_config_path() {
                Some(path) => output::detail(&format!("global: {}{}", path.display(), marker(&path))),
                None => output::warning("no global config directory on this platform"),
            }
            let local = local_config_path(project_dir);
            output::detail(&format!("local:  {}{}", local.display(), marker(&local)));
        }
        ConfigCommands::Template => {
            output::info(&Settings::template());
        }
    }
    Ok(())
}
