//! Command-line interface for the reader.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::{Parser, Subcommand};
use console::style;
use roxmltree::Document;

use crate::config::{ReaderOptions, MAX_DOCUMENT_SIZE};
use crate::error::{ReaderError, Result};
use crate::factory::GraphBuilder;
use crate::instance::Instance;
use crate::registry::{load_catalogs, Catalog, MaxOccurs, TypeRegistry};
use crate::value::Value;

/// rama - Read data model annotations from VOTables.
#[derive(Parser)]
#[command(name = "rama")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build all instances of a type and print them as an outline.
    Inspect {
        /// Annotated VOTable file
        file: PathBuf,

        /// Model type id to look for (e.g., meas:SkyPosition)
        #[arg(short = 't', long = "type")]
        type_id: String,

        /// Extra type catalog, loaded after the bundled ones (repeatable)
        #[arg(short, long)]
        catalog: Vec<PathBuf>,

        /// Reader options file (YAML)
        #[arg(short, long)]
        options: Option<PathBuf>,

        /// Maximum instance nesting depth
        #[arg(long)]
        max_depth: Option<usize>,

        /// Fail when a field has fewer values than its declared minimum
        #[arg(long)]
        strict: bool,
    },

    /// List the registered model types.
    Types {
        /// Extra type catalog, loaded after the bundled ones (repeatable)
        #[arg(short, long)]
        catalog: Vec<PathBuf>,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect {
            file,
            type_id,
            catalog,
            options,
            max_depth,
            strict,
        } => {
            let mut reader_options = match options {
                Some(path) => ReaderOptions::from_yaml_file(&path)?,
                None => ReaderOptions::default(),
            };
            if let Some(max_depth) = max_depth {
                reader_options = reader_options.with_max_depth(max_depth);
            }
            if strict {
                reader_options = reader_options.with_strict_multiplicity(true);
            }
            reader_options.validate()?;
            inspect_command(&file, &type_id, &catalog, reader_options)
        }
        Commands::Types { catalog } => types_command(&catalog),
    }
}

/// Create a builder from the bundled catalogs plus `extra` catalog files.
pub fn builder_from_catalogs(extra: &[PathBuf]) -> Result<GraphBuilder> {
    let mut catalogs = Catalog::bundled()?;
    for path in extra {
        catalogs.push(Catalog::from_file(path)?);
    }
    let (registry, coercion) = load_catalogs(&catalogs)?;
    Ok(GraphBuilder::new(registry).with_coercion(coercion))
}

fn read_document(path: &Path) -> Result<String> {
    let size = std::fs::metadata(path)?.len();
    if size > MAX_DOCUMENT_SIZE {
        return Err(ReaderError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!(
                "{} is {size} bytes, the limit is {MAX_DOCUMENT_SIZE}",
                path.display()
            ),
        )));
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Execute the inspect command.
fn inspect_command(
    file: &Path,
    type_id: &str,
    catalogs: &[PathBuf],
    options: ReaderOptions,
) -> Result<()> {
    let builder = builder_from_catalogs(catalogs)?.with_options(options);
    if !builder.registry().contains(type_id) {
        return Err(ReaderError::UnknownType(type_id.to_string()));
    }

    let xml = read_document(file)?;
    let document = Document::parse(&xml)?;
    let mut context = builder.context(&document);
    let instances = context.find_instances(type_id)?;

    println!(
        "{} {} in {}",
        style(instances.len()).bold(),
        style(type_id).cyan(),
        file.display()
    );
    println!();
    print!("{}", render_outline(&instances));

    let diagnostics = context.take_diagnostics();
    if !diagnostics.is_empty() {
        println!();
        println!("{}", style("Diagnostics:").yellow().bold());
        for diagnostic in &diagnostics {
            println!("  {diagnostic}");
        }
    }

    Ok(())
}

/// Execute the types command.
fn types_command(catalogs: &[PathBuf]) -> Result<()> {
    let builder = builder_from_catalogs(catalogs)?;
    print!("{}", render_types(builder.registry())?);
    Ok(())
}

/// One line per registered type with its flattened fields.
pub fn render_types(registry: &TypeRegistry) -> Result<String> {
    let mut out = String::new();
    for type_id in registry.type_ids() {
        let descriptor = registry.resolve(type_id)?;
        out.push_str(type_id);
        if !descriptor.extends.is_empty() {
            out.push_str(&format!(" : {}", descriptor.extends.join(", ")));
        }
        out.push('\n');
        for field in registry.fields_of(&descriptor)?.iter() {
            let max = match field.max_occurs {
                MaxOccurs::One => "1",
                MaxOccurs::Unbounded => "*",
            };
            out.push_str(&format!(
                "    {} ({}, {}..{max})\n",
                field.role, field.kind, field.min_occurs
            ));
        }
    }
    Ok(out)
}

/// Render instances as an indented outline.
///
/// An instance reachable more than once is expanded the first time and
/// printed as `(see above)` afterwards, which also cuts cycles.
#[must_use]
pub fn render_outline(instances: &[Rc<Instance>]) -> String {
    let mut outline = Outline::default();
    for instance in instances {
        outline.instance("", instance, 0);
    }
    outline.out
}

#[derive(Default)]
struct Outline {
    out: String,
    seen: HashSet<*const Instance>,
}

impl Outline {
    fn line(&mut self, depth: usize, text: &str) {
        self.out.push_str(&"  ".repeat(depth));
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn instance(&mut self, label: &str, instance: &Rc<Instance>, depth: usize) {
        let name = match instance.id() {
            Some(id) => format!("{} #{id}", instance.type_id()),
            None => instance.type_id().to_string(),
        };
        if !self.seen.insert(Rc::as_ptr(instance)) {
            self.line(depth, &format!("{label}{name} (see above)"));
            return;
        }

        self.line(depth, &format!("{label}{name}"));
        for (field, value) in instance.fields() {
            let label = format!("{}: ", short_role(&field.role));
            self.value(&label, value, depth + 1);
        }
    }

    fn value(&mut self, label: &str, value: Option<&Value>, depth: usize) {
        match value {
            None => self.line(depth, &format!("{label}(unassigned)")),
            Some(Value::Absent) => self.line(depth, &format!("{label}(absent)")),
            Some(Value::Undefined) => self.line(depth, &format!("{label}(undefined)")),
            Some(Value::Literal(literal)) => self.line(depth, &format!("{label}{literal}")),
            Some(Value::Column(column)) => {
                let unit = column
                    .unit
                    .as_deref()
                    .map(|u| format!(", {u}"))
                    .unwrap_or_default();
                self.line(
                    depth,
                    &format!(
                        "{label}column {} of {} ({} rows{unit})",
                        column.name,
                        column.table().id(),
                        column.len()
                    ),
                );
            }
            Some(Value::Instance(link)) => match link.upgrade() {
                Some(instance) => self.instance(label, &instance, depth),
                None => self.line(depth, &format!("{label}(dropped)")),
            },
            Some(Value::Domain(value)) => {
                self.line(depth, &format!("{label}<{}>", value.type_name()));
            }
            Some(Value::Sequence(values)) => {
                self.line(depth, &format!("{label}[{}]", values.len()));
                for item in values {
                    self.value("- ", Some(item), depth + 1);
                }
            }
        }
    }
}

/// Last segment of a role id (`meas:CoordMeasure.coord` -> `coord`).
fn short_role(role: &str) -> &str {
    role.rsplit(['.', ':']).next().unwrap_or(role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_inspect() {
        let cli = Cli::parse_from([
            "rama",
            "inspect",
            "positions.xml",
            "--type",
            "meas:SkyPosition",
        ]);

        let Commands::Inspect {
            file,
            type_id,
            catalog,
            options,
            max_depth,
            strict,
        } = cli.command
        else {
            panic!("expected inspect");
        };
        assert_eq!(file, PathBuf::from("positions.xml"));
        assert_eq!(type_id, "meas:SkyPosition");
        assert!(catalog.is_empty());
        assert!(options.is_none());
        assert!(max_depth.is_none());
        assert!(!strict);
    }

    #[test]
    fn test_cli_parse_inspect_with_catalogs() {
        let cli = Cli::parse_from([
            "rama",
            "inspect",
            "positions.xml",
            "-t",
            "test:Thing",
            "--catalog",
            "a.yaml",
            "--catalog",
            "b.yaml",
            "--strict",
            "--max-depth",
            "4",
        ]);

        let Commands::Inspect {
            catalog,
            strict,
            max_depth,
            ..
        } = cli.command
        else {
            panic!("expected inspect");
        };
        assert_eq!(catalog.len(), 2);
        assert!(strict);
        assert_eq!(max_depth, Some(4));
    }

    #[test]
    fn test_cli_parse_types() {
        let cli = Cli::parse_from(["rama", "types"]);
        assert!(matches!(cli.command, Commands::Types { .. }));
    }

    #[test]
    fn test_short_role() {
        assert_eq!(short_role("meas:CoordMeasure.coordFrame"), "coordFrame");
        assert_eq!(
            short_role("coords:domain.space.SpaceFrame.spaceRefFrame"),
            "spaceRefFrame"
        );
        assert_eq!(short_role("plain"), "plain");
    }

    #[test]
    fn test_render_outline_marks_shared_instances() {
        let graph = builder_from_catalogs(&[])
            .unwrap()
            .read_str(
                r#"<VODML><GLOBALS>
                  <INSTANCE dmtype="coords:domain.space.SpaceFrame" ID="_f"/>
                  <INSTANCE dmtype="meas:SkyPosition">
                    <REFERENCE dmrole="meas:CoordMeasure.coordFrame"><IDREF>_f</IDREF></REFERENCE>
                  </INSTANCE>
                  <INSTANCE dmtype="meas:SkyPosition">
                    <REFERENCE dmrole="meas:CoordMeasure.coordFrame"><IDREF>_f</IDREF></REFERENCE>
                  </INSTANCE>
                </GLOBALS></VODML>"#,
                "meas:SkyPosition",
            )
            .unwrap();

        let outline = render_outline(graph.roots());
        assert_eq!(
            outline
                .matches("coordFrame: coords:domain.space.SpaceFrame #_f")
                .count(),
            2
        );
        assert_eq!(outline.matches("(see above)").count(), 1);
        assert!(outline.contains("coord: (absent)"));
    }

    #[test]
    fn test_render_types_lists_inherited_fields() {
        let builder = builder_from_catalogs(&[]).unwrap();
        let rendered = render_types(builder.registry()).unwrap();
        assert!(rendered.contains("meas:SkyPosition : meas:CoordMeasure\n"));
        assert!(rendered.contains("    meas:CoordMeasure.coordFrame (reference, 0..1)\n"));
    }
}
