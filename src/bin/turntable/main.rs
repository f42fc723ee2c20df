//! Turntable CLI - glTF viewer with an idle turntable orbit.

use std::env;
use std::path::Path;

use turntable::scene;

use std::sync::atomic::{AtomicU8, Ordering};

/// Verbosity level (thread-safe)
const LOG_QUIET: u8 = 0;
const LOG_INFO: u8 = 1;
const LOG_DEBUG: u8 = 2;
const LOG_TRACE: u8 = 3;

static LOG_LEVEL: AtomicU8 = AtomicU8::new(LOG_INFO);

#[inline]
fn log_level() -> u8 {
    LOG_LEVEL.load(Ordering::Relaxed)
}

#[inline]
fn set_log_level(level: u8) {
    LOG_LEVEL.store(level, Ordering::Relaxed);
}

macro_rules! info {
    ($($arg:tt)*) => {
        if log_level() >= LOG_INFO {
            println!("[INFO] {}", format!($($arg)*));
        }
    };
}

macro_rules! debug {
    ($($arg:tt)*) => {
        if log_level() >= LOG_DEBUG {
            println!("[DEBUG] {}", format!($($arg)*));
        }
    };
}

macro_rules! trace {
    ($($arg:tt)*) => {
        if log_level() >= LOG_TRACE {
            println!("[TRACE] {}", format!($($arg)*));
        }
    };
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => set_log_level(LOG_DEBUG),
            "-vv" | "--trace" => set_log_level(LOG_TRACE),
            "-q" | "--quiet" => set_log_level(LOG_QUIET),
            "-h" | "--help" => {
                print_help();
                return;
            }
            // Command-scoped flag, resolved below
            "--json" | "-j" => filtered_args.push(arg),
            s if s.starts_with('-') => {
                eprintln!("Unknown option: {}", s);
                eprintln!("Run 'turntable-cli help' for usage");
                std::process::exit(1);
            }
            _ => filtered_args.push(arg),
        }
    }

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    match filtered_args[0] {
        // View command - launch the viewer
        "view" | "v" => {
            cmd_view(filtered_args.get(1).copied());
        }

        // Info command - show scene summary
        "info" | "i" => {
            let json_mode = filtered_args.iter().any(|&s| s == "--json" || s == "-j");
            if json_mode {
                set_log_level(LOG_QUIET);
            }
            let file = filtered_args[1..]
                .iter()
                .find(|&&s| s != "--json" && s != "-j")
                .copied();
            match file {
                Some(file) => cmd_info(file, json_mode),
                None => {
                    eprintln!("Error: missing file argument");
                    eprintln!("Usage: turntable-cli info <file.gltf> [--json]");
                    std::process::exit(1);
                }
            }
        }

        // Help
        "help" | "h" => print_help(),

        // Default: if file exists, open the viewer; otherwise error
        _ => {
            if Path::new(filtered_args[0]).exists() {
                cmd_view(Some(filtered_args[0]));
            } else {
                eprintln!("Unknown command: {}", filtered_args[0]);
                eprintln!();
                print_help();
                std::process::exit(1);
            }
        }
    }
}

fn print_help() {
    println!(
        "turntable {} ({} {}) - glTF viewer with an idle turntable orbit",
        env!("CARGO_PKG_VERSION"),
        env!("TURNTABLE_BUILD_DATE"),
        env!("TURNTABLE_BUILD_TIME"),
    );
    println!();
    println!("USAGE:");
    println!("    turntable-cli [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    v, view   [file]              Open the viewer (Esc to exit)");
    println!("    i, info   <file> [--json]     Show scene and mesh counts");
    println!("    h, help                       Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Suppress all output");
    println!();
    println!("EXAMPLES:");
    println!("    turntable-cli view pump.gltf          # Open in the viewer");
    println!("    turntable-cli pump.gltf               # Same, bare path opens the viewer");
    println!("    turntable-cli info scene.glb          # Quick overview");
    println!("    turntable-cli info scene.glb --json   # Machine-readable counts");
    println!("    turntable-cli -v info large.glb       # Verbose info");
    println!();
    println!("NOTES:");
    println!("    - Passing a .gltf/.glb file directly is equivalent to 'view'");
    println!("    - Viewer requires --features viewer (enabled by default)");
    println!("    - Leave the camera untouched for two seconds to start the turntable orbit");
    println!("    - Press Esc to close the viewer");
}

fn cmd_view(file: Option<&str>) {
    #[cfg(feature = "viewer")]
    {
        let file = file.map(std::path::PathBuf::from);
        if let Err(e) = turntable::viewer::run(file) {
            eprintln!("Viewer error: {}", e);
            std::process::exit(1);
        }
    }
    #[cfg(not(feature = "viewer"))]
    {
        let _ = file;
        eprintln!("Viewer not available. Rebuild with: cargo build --features viewer");
        std::process::exit(1);
    }
}

fn cmd_info(path: &str, json_mode: bool) {
    info!("Loading scene: {}", path);

    let scene = match scene::load_gltf(Path::new(path)) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load {}: {}", path, e);
            std::process::exit(1);
        }
    };

    debug!("Scene loaded: {} primitives", scene.meshes.len());
    for mesh in &scene.meshes {
        trace!(
            "primitive '{}': {} verts, {} tris",
            mesh.name,
            mesh.positions.len(),
            mesh.indices.len() / 3
        );
    }

    if json_mode {
        let bounds = scene.bounds().map(|(min, max)| {
            serde_json::json!({
                "min": [min.x, min.y, min.z],
                "max": [max.x, max.y, max.z],
            })
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "file": path,
                "nodes": scene.node_count,
                "meshes": scene.mesh_count,
                "primitives": scene.meshes.len(),
                "vertices": scene.vertex_count(),
                "triangles": scene.triangle_count(),
                "bounds": bounds,
            }))
            .unwrap_or_default()
        );
        return;
    }

    println!("Scene: {}", path);
    println!();
    println!("Nodes:      {}", scene.node_count);
    println!(
        "Meshes:     {} ({} primitives)",
        scene.mesh_count,
        scene.meshes.len()
    );
    println!("Vertices:   {}", scene.vertex_count());
    println!("Triangles:  {}", scene.triangle_count());

    if let Some((min, max)) = scene.bounds() {
        let size = max - min;
        println!(
            "Bounds:     ({:.3}, {:.3}, {:.3}) .. ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        println!(
            "Size:       {:.3} x {:.3} x {:.3}",
            size.x, size.y, size.z
        );
    }
}
