use std::path::PathBuf;
use std::process::ExitCode;

use bvh_kinematics::{load_bvh_from_file, Bvh, Joint};
use clap::Parser;
use tracing::{error, Level};

#[derive(clap::Parser)]
#[command(version, about = "Parse a .bvh file and print joint world positions")]
struct Opts {
    /// Path to the .bvh file.
    path: PathBuf,

    /// Frame to print positions for.
    #[arg(short, long, default_value_t = 0)]
    frame: usize,

    /// Only print this joint.
    #[arg(short, long)]
    joint: Option<String>,

    /// More logging (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn print_joint(joint: &Joint, frame: usize) {
    let indent = "  ".repeat(joint.depth);
    match joint.position(frame) {
        Some(p) => println!("{}{} ({:.4}, {:.4}, {:.4})", indent, joint.name(), p.x, p.y, p.z),
        None => println!("{}{} (no frame {})", indent, joint.name(), frame),
    }
}

fn print_summary(bvh: &Bvh) {
    let root = bvh.root_joint().map(|j| j.name()).unwrap_or("-");
    println!("root: {}", root);
    println!("joints: {}", bvh.joints().len());
    println!("channels: {}", bvh.num_channels());
    println!("frames: {}", bvh.num_frames());
    println!("frame time: {} ({} fps)", bvh.frame_time(), bvh.fps());
}

fn main() -> ExitCode {
    let opts = Opts::parse();

    let level = match opts.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let bvh = match load_bvh_from_file(&opts.path) {
        Ok(bvh) => bvh,
        Err(err) => {
            error!("Could not load {}: {}", opts.path.display(), err);
            return ExitCode::FAILURE;
        }
    };

    print_summary(&bvh);
    match opts.joint.as_deref() {
        Some(name) => match bvh.joint_by_name(name) {
            Some(joint) => print_joint(joint, opts.frame),
            None => {
                error!("No joint named \"{}\"", name);
                return ExitCode::FAILURE;
            }
        },
        None => bvh.joints().iter().for_each(|joint| print_joint(joint, opts.frame)),
    }
    ExitCode::SUCCESS
}
