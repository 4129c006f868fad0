use std::fmt::Write as _;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};

use crate::app::App;
use crate::binding::Bindings;
use crate::config::{self, InsertMode, MerlinConfig};
use crate::models::{Template, VariableType};
use crate::parser::{label_preview, substitute};
use crate::store::{Store, Workspace};
use crate::system::write_stdout;

/// Top-level CLI for Merlin.
#[derive(Debug, Parser)]
#[command(name = "merlin")]
#[command(about = "Merlin: fill in text templates and insert the result", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum CliCommand {
    /// Open the interactive template picker (the default).
    Popup {
        /// Print the filled text on stdout instead of copying it.
        #[arg(long)]
        print: bool,
    },

    /// List templates, optionally filtered by a search query.
    List {
        /// Matched against title, trigger and content.
        query: Option<String>,

        /// Include inactive templates.
        #[arg(long)]
        all: bool,
    },

    /// List teams and what they use templates for.
    Teams,

    /// Show the fields a template asks for.
    Fields {
        /// Template trigger, e.g. `/hello`.
        trigger: String,
    },

    /// Fill a template and print the result.
    Render {
        /// Template trigger, e.g. `/hello`.
        trigger: String,

        /// Placeholder value; may be repeated.
        #[arg(short = 's', long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        values: Vec<(String, String)>,
    },

    /// Show a template with its placeholders replaced by their labels.
    Preview {
        /// Template trigger, e.g. `/hello`.
        trigger: String,
    },
}

impl CliCommand {
    pub(crate) fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        let mut workspace = Workspace::demo().context("failed to seed template store")?;

        match cli.command.unwrap_or(CliCommand::Popup { print: false }) {
            CliCommand::Popup { print } => {
                let cfg = if print {
                    MerlinConfig {
                        insert_mode: InsertMode::Stdout,
                        ..cfg
                    }
                } else {
                    cfg
                };
                let app = App::new(workspace, &cfg);
                if let Some(output) = crate::run_popup(app)? {
                    write_stdout(&output)?;
                }
            }
            CliCommand::List { query, all } => {
                let found = workspace.search(query.as_deref().unwrap_or(""), all);
                write_stdout(&format_list(&workspace, &found))?;
            }
            CliCommand::Teams => {
                write_stdout(&format_teams(&workspace))?;
            }
            CliCommand::Fields { trigger } => {
                let template = lookup(&workspace, &trigger)?;
                write_stdout(&format_fields(&template))?;
            }
            CliCommand::Render { trigger, values } => {
                let output = render(&mut workspace, &trigger, &values)?;
                write_stdout(&output)?;
            }
            CliCommand::Preview { trigger } => {
                let template = lookup(&workspace, &trigger)?;
                let mut preview = label_preview(&template.content, &template.variables);
                preview.push('\n');
                write_stdout(&preview)?;
            }
        }
        Ok(())
    }
}

fn parse_assignment(input: &str) -> Result<(String, String), String> {
    let (name, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{input}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing placeholder name in `{input}`"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn lookup(workspace: &Workspace, trigger: &str) -> Result<Template> {
    workspace
        .find_by_trigger(trigger)
        .ok_or_else(|| anyhow!("no template with trigger `{trigger}`"))
}

/// Fills the template behind `trigger` and counts the use.
fn render(workspace: &mut Workspace, trigger: &str, values: &[(String, String)]) -> Result<String> {
    let template = lookup(workspace, trigger)?;
    let mut bindings = Bindings::for_template(&template);
    for (name, value) in values {
        if !bindings.set(name, value.as_str()) {
            tracing::warn!(trigger, name = name.as_str(), "ignoring value for unknown placeholder");
        }
    }
    let output = substitute(&template.content, &bindings.values());
    workspace.record_usage(template.id)?;
    Ok(output)
}

fn format_list(workspace: &Workspace, templates: &[Template]) -> String {
    let mut out = String::new();
    for template in templates {
        let _ = write!(
            out,
            "{:<12} {:<24} {:<12} {:>4} uses",
            template.trigger,
            template.title,
            workspace.team_name(template.team_id),
            template.usage_count
        );
        if !template.is_active {
            out.push_str("  (inactive)");
        }
        out.push('\n');
    }
    out
}

fn format_teams(workspace: &Workspace) -> String {
    let mut out = String::new();
    for team in workspace.teams.list() {
        let _ = write!(out, "{:<4} {:<16}", team.id, team.name);
        if !team.description.is_empty() {
            let _ = write!(out, " {}", team.description);
        }
        out.push('\n');
    }
    out
}

fn format_fields(template: &Template) -> String {
    let mut out = String::new();
    for field in Bindings::for_template(template).fields() {
        let kind = match field.kind {
            VariableType::Text => "text",
            VariableType::Textarea => "textarea",
            VariableType::Date => "date",
            VariableType::Select => "select",
        };
        let _ = write!(out, "{:<12} {:<20} {kind}", field.name, field.label);
        if field.required {
            out.push_str(" required");
        }
        if !field.options.is_empty() {
            let _ = write!(out, " [{}]", field.options.join(" | "));
        }
        out.push('\n');
    }
    out
}
