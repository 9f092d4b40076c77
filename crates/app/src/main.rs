//! Command-line driver: load mesh assets and report what was built.
//!
//! Usage: `app [--mesh-root=DIR] [--texture-root=DIR] [--show-material] NAME...`

use anyhow::{Context, Result};
use asset::{AssetRoots, MeshAsset, MeshFactory};

fn parse_roots_args(args: &[String]) -> AssetRoots {
    let mut roots = AssetRoots::default();
    for arg in args {
        if let Some(val) = arg.strip_prefix("--mesh-root=") {
            roots.meshes = val.into();
        } else if let Some(val) = arg.strip_prefix("--texture-root=") {
            roots.textures = val.into();
        }
    }
    roots
}

fn parse_show_material_arg(args: &[String]) -> bool {
    // --show-material[=on|off], off by default
    for arg in args {
        if arg == "--show-material" {
            return true;
        }
        if let Some(val) = arg.strip_prefix("--show-material=") {
            return matches!(
                val.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            );
        }
    }
    false
}

fn parse_asset_names(args: &[String]) -> Vec<&str> {
    args.iter()
        .map(String::as_str)
        .filter(|arg| !arg.starts_with("--"))
        .collect()
}

fn report(mesh: &MeshAsset, show_material: bool) {
    log::info!(
        "{}: {} vertices ({} bytes), {} indices ({} bytes)",
        mesh.name(),
        mesh.vertex_count(),
        mesh.vertex_bytes().len(),
        mesh.index_count(),
        mesh.index_bytes().len()
    );
    if show_material {
        let m = mesh.material();
        log::info!(
            "  material '{}': textures ambient={:?} diffuse={:?} specular={:?}",
            m.name,
            m.ambient_texture,
            m.diffuse_texture,
            m.specular_texture
        );
        log::info!("  uniform {:?}", m.uniform());
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let roots = parse_roots_args(&args);
    let show_material = parse_show_material_arg(&args);
    let names = parse_asset_names(&args);
    log::info!(
        "Mesh root: {}, texture root: {}, {} asset(s)",
        roots.meshes.display(),
        roots.textures.display(),
        names.len()
    );

    if names.is_empty() {
        log::warn!("Nothing to load. Usage: app [--mesh-root=DIR] [--texture-root=DIR] NAME...");
        return Ok(());
    }

    let factory = MeshFactory::from_roots(&roots);
    for name in names {
        let mesh = factory
            .create(name)
            .with_context(|| format!("Failed to load mesh '{}'", name))?;
        report(&mesh, show_material);
    }

    log::info!("{} texture(s) cached", factory.textures().len());
    Ok(())
}
