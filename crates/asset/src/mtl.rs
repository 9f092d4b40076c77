//! Wavefront MTL parser.
//!
//! Material data is always optional: bad values are logged and skipped, never
//! fatal to the mesh that references the library.

use std::io::{self, BufRead};

use corelib::{MaterialFieldError, Vec3};

use crate::{
    material::Material,
    source::lossy_lines,
    texture::{TextureCache, TextureHandle, TextureLoader},
};

/// Parse every `newmtl` block of a library, in declaration order.
pub fn parse_mtl<R: BufRead, L: TextureLoader>(
    reader: R,
    source_name: &str,
    textures: &TextureCache<L>,
) -> Vec<Material> {
    let mut materials: Vec<Material> = Vec::new();

    for (line_no, line) in lossy_lines(reader).enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                log::warn!(
                    "{}: stopped reading at line {}: {}",
                    source_name,
                    line_no + 1,
                    err
                );
                break;
            }
        };

        if let Err(err) = apply_line(&mut materials, line_no + 1, &line, textures) {
            log::warn!("{}: {}", source_name, err);
        }
    }

    log::debug!("{}: {} material(s)", source_name, materials.len());
    materials
}

/// Convenience helper to parse an MTL string literal.
pub fn parse_mtl_str<L: TextureLoader>(contents: &str, textures: &TextureCache<L>) -> Vec<Material> {
    parse_mtl(io::Cursor::new(contents), "<memory>", textures)
}

fn apply_line<L: TextureLoader>(
    materials: &mut Vec<Material>,
    line_no: usize,
    line: &str,
    textures: &TextureCache<L>,
) -> Result<(), MaterialFieldError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(());
    }

    let mut parts = trimmed.split_whitespace();
    let Some(tag) = parts.next() else {
        return Ok(());
    };
    let rest = trimmed[tag.len()..].trim();

    if tag == "newmtl" {
        if rest.is_empty() {
            return Err(missing(tag, line_no));
        }
        materials.push(Material::new(rest));
        return Ok(());
    }

    if !is_property(tag) {
        return Ok(());
    }

    let material = materials
        .last_mut()
        .ok_or_else(|| MaterialFieldError::NoCurrentMaterial {
            directive: tag.to_owned(),
            line: line_no,
        })?;

    match tag {
        "Ns" => material.specular_factor = parse_factor(parts, tag, line_no)?,
        "d" => material.dissolve_factor = parse_factor(parts, tag, line_no)?,
        "Ka" => material.ambient_color = parse_color(parts, tag, line_no)?,
        "Kd" => material.diffuse_color = parse_color(parts, tag, line_no)?,
        "Ks" => material.specular_color = parse_color(parts, tag, line_no)?,
        "Ke" => material.emissive_color = parse_color(parts, tag, line_no)?,
        "map_Ka" | "map_Kd" | "map_Ks" => {
            if rest.is_empty() {
                return Err(missing(tag, line_no));
            }
            let Some(handle) = resolve_texture(textures, rest, &material.name) else {
                return Ok(());
            };
            match tag {
                "map_Ka" => material.ambient_texture = handle,
                "map_Kd" => material.diffuse_texture = handle,
                _ => material.specular_texture = handle,
            }
        }
        _ => {}
    }

    Ok(())
}

fn is_property(tag: &str) -> bool {
    matches!(
        tag,
        "Ns" | "d" | "Ka" | "Kd" | "Ks" | "Ke" | "map_Ka" | "map_Kd" | "map_Ks"
    )
}

fn resolve_texture<L: TextureLoader>(
    textures: &TextureCache<L>,
    path: &str,
    material: &str,
) -> Option<TextureHandle> {
    match textures.resolve(path) {
        Ok(handle) => Some(handle),
        Err(err) => {
            log::warn!("Material '{}': {:#}", material, err);
            None
        }
    }
}

fn missing(tag: &str, line_no: usize) -> MaterialFieldError {
    MaterialFieldError::MissingValue {
        directive: tag.to_owned(),
        line: line_no,
    }
}

fn parse_number(token: &str, tag: &str, line_no: usize) -> Result<f32, MaterialFieldError> {
    token
        .parse::<f32>()
        .map_err(|_| MaterialFieldError::InvalidNumber {
            directive: tag.to_owned(),
            line: line_no,
            token: token.to_owned(),
        })
}

fn parse_factor<'t>(
    mut tokens: impl Iterator<Item = &'t str>,
    tag: &str,
    line_no: usize,
) -> Result<f32, MaterialFieldError> {
    let token = tokens.next().ok_or_else(|| missing(tag, line_no))?;
    parse_number(token, tag, line_no)
}

/// `r g b`, or a single value applied to all three channels.
fn parse_color<'t>(
    tokens: impl Iterator<Item = &'t str>,
    tag: &str,
    line_no: usize,
) -> Result<Vec3, MaterialFieldError> {
    let values = tokens
        .map(|token| parse_number(token, tag, line_no))
        .collect::<Result<Vec<f32>, _>>()?;

    match values.as_slice() {
        [v] => Ok(Vec3::splat(*v)),
        [r, g, b] => Ok(Vec3::new(*r, *g, *b)),
        [] => Err(missing(tag, line_no)),
        other => Err(MaterialFieldError::Arity {
            directive: tag.to_owned(),
            line: line_no,
            expected: 3,
            found: other.len(),
        }),
    }
}
