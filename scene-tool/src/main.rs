use std::path::PathBuf;

use anyhow::{bail, Result};
use cgmath::{EuclideanSpace, Point3, Vector3};
use clap::{Parser, Subcommand};
use log::{debug, info};
use xform_common::{create_aim_matrix, Axis};
use xform_scene::channels::{decompose_node, offset_matrix, translation};
use xform_scene::common::{is_identity, EPSILON};
use xform_scene::{
    apply_world_matrix, copy_transform, freeze, unfreeze, walk_tree, ApplyOptions, Channels,
    FreezeOptions, LogSink, NodeId, NodeKind, Scene, Space, TreeVisitor,
};

#[derive(Parser)]
#[command(name = "xform-tool")]
#[command(about = "Inspect and edit transforms in JSON scene files")]
#[command(version)]
struct Cli {
    /// Scene file (.json)
    scene: PathBuf,

    /// Output path (defaults to overwriting the input)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Print debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the node hierarchy with decomposed local transforms
    Info,

    /// Move translate and rotate into the offset matrix and bake scale into children
    Freeze {
        node: String,
        #[arg(long)]
        no_translate: bool,
        #[arg(long)]
        no_rotate: bool,
        #[arg(long)]
        no_scale: bool,
    },

    /// Move the offset matrix back into the channels
    Unfreeze { node: String },

    /// Move a node to the world pose of another
    Copy {
        source: String,
        target: String,
        /// Keep the target's descendants where they are
        #[arg(long)]
        preserve_children: bool,
    },

    /// Rotate a node in place so one axis points along a direction
    Aim {
        node: String,
        /// World direction for the forward axis, as x,y,z
        #[arg(long, value_parser = parse_vector, allow_hyphen_values = true)]
        forward: Vector3<f64>,
        /// World up direction, as x,y,z
        #[arg(long, value_parser = parse_vector, allow_hyphen_values = true)]
        up: Vector3<f64>,
        #[arg(long, value_parser = parse_axis, default_value = "x")]
        forward_axis: Axis,
        #[arg(long, value_parser = parse_axis, default_value = "y")]
        up_axis: Axis,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    debug!("Loading {}", cli.scene.display());
    let mut scene = Scene::load_from_file(&cli.scene)?;

    match cli.command {
        Command::Info => {
            print_tree(&scene)?;
            return Ok(());
        }
        Command::Freeze {
            node,
            no_translate,
            no_rotate,
            no_scale,
        } => {
            let id = find(&scene, &node)?;
            let options = FreezeOptions {
                translate: !no_translate,
                rotate: !no_rotate,
                scale: !no_scale,
            };
            if !freeze(&mut scene, id, options, &mut LogSink)? {
                info!("{} is already frozen", node);
            }
        }
        Command::Unfreeze { node } => {
            let id = find(&scene, &node)?;
            if !unfreeze(&mut scene, id)? {
                info!("{} has no offset matrix to unfreeze", node);
            }
        }
        Command::Copy {
            source,
            target,
            preserve_children,
        } => {
            let source = find(&scene, &source)?;
            let target = find(&scene, &target)?;
            let options = ApplyOptions {
                preserve_children,
                ..ApplyOptions::default()
            };
            copy_transform(&mut scene, source, target, options)?;
        }
        Command::Aim {
            node,
            forward,
            up,
            forward_axis,
            up_axis,
        } => {
            let id = find(&scene, &node)?;
            aim_node(&mut scene, id, (forward_axis, forward), (up_axis, up))?;
        }
    }

    let output = cli.output.unwrap_or(cli.scene);
    scene.save_to_file(&output)?;
    info!("Saved {}", output.display());

    Ok(())
}

fn find(scene: &Scene, name: &str) -> Result<NodeId> {
    match scene.find_node(name) {
        Some(id) => Ok(id),
        None => bail!("No node named '{}'", name),
    }
}

/// Rotates `node` so `forward.0` points along `forward.1`, keeping its
/// world position and its scale channels.
fn aim_node(
    scene: &mut Scene,
    node: NodeId,
    forward: (Axis, Vector3<f64>),
    up: (Axis, Vector3<f64>),
) -> Result<()> {
    let origin = Point3::from_vec(translation(&*scene, node, Space::World)?);
    let aim = create_aim_matrix(forward.0, forward.1, up.0, up.1, origin, 1.0, 1.0)?;
    let options = ApplyOptions::default().with_skip(Channels::SCALE);
    apply_world_matrix(scene, node, &aim, options)?;
    debug!("Aimed {} along {:?}", node, forward.1);
    Ok(())
}

fn parse_vector(value: &str) -> Result<Vector3<f64>, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f64>().map_err(|e| format!("{}: {}", part, e)))
        .collect::<Result<Vec<_>, _>>()?;

    match parts.as_slice() {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(format!("expected x,y,z, got '{}'", value)),
    }
}

fn parse_axis(value: &str) -> Result<Axis, String> {
    match value.to_ascii_lowercase().as_str() {
        "x" => Ok(Axis::X),
        "y" => Ok(Axis::Y),
        "z" => Ok(Axis::Z),
        _ => Err(format!("expected x, y or z, got '{}'", value)),
    }
}

struct TreePrinter<'a> {
    scene: &'a Scene,
    lines: Vec<String>,
}

impl TreeVisitor for TreePrinter<'_> {
    fn enter_node(&mut self, node: NodeId, kind: &NodeKind, depth: usize) -> bool {
        let Some(entry) = self.scene.get_node(node) else {
            return false;
        };
        let indent = "  ".repeat(depth);
        let mut line = format!("{}{} ({})", indent, entry.name(), kind);

        if kind.is_transform() {
            if let Ok(components) = decompose_node(self.scene, node, Space::Object) {
                line.push_str(&format!(" {}", components));
            }
            if let Ok(offset) = offset_matrix(self.scene, node) {
                if !is_identity(&offset, EPSILON) {
                    line.push_str(" [frozen]");
                }
            }
        } else if !entry.points().is_empty() {
            line.push_str(&format!(" {} points", entry.points().len()));
        }

        self.lines.push(line);
        true
    }
}

fn print_tree(scene: &Scene) -> Result<()> {
    let mut printer = TreePrinter {
        scene,
        lines: Vec::new(),
    };
    for root in scene.root_nodes() {
        walk_tree(scene, *root, &mut printer)?;
    }

    println!("Nodes: {}", scene.len());
    for line in printer.lines {
        println!("{}", line);
    }
    Ok(())
}
