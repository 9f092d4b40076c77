//! Line parser for Wavefront OBJ geometry.
//!
//! Produces raw attribute lists and face corners in file order. Index
//! resolution and vertex layout happen later in [`crate::builder`].

use std::{
    io::{self, BufRead},
    str::SplitWhitespace,
};

use corelib::{AssetError, AssetResult, Vec2, Vec3};

use crate::source::lossy_lines;

/// One corner of a face. Indices are 1-based and positive; relative
/// (negative) references are made absolute while parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceCorner {
    pub position: u32,
    pub texcoord: Option<u32>,
    pub normal: Option<u32>,
}

/// Everything read from one geometry file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedMeshData {
    pub positions: Vec<Vec3>,
    pub texcoords: Vec<Vec2>,
    pub normals: Vec<Vec3>,
    /// Three corners per triangle, in draw order.
    pub corners: Vec<FaceCorner>,
    /// Source line of each triangle, for error reporting.
    pub face_lines: Vec<usize>,
    /// `mtllib` paths, relative to the geometry root.
    pub material_libraries: Vec<String>,
    /// First `usemtl` seen, if any.
    pub material_name: Option<String>,
}

impl ParsedMeshData {
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.corners.len() / 3
    }
}

/// Parse OBJ text from any [`BufRead`]. `source_name` only feeds error messages.
pub fn parse_obj<R: BufRead>(reader: R, source_name: &str) -> AssetResult<ParsedMeshData> {
    let mut parser = ObjParser::new(source_name);
    for (line_no, line) in lossy_lines(reader).enumerate() {
        let line = line.map_err(|e| read_error(source_name, line_no + 1, e))?;
        parser.parse_line(line_no + 1, &line)?;
    }
    Ok(parser.finish())
}

/// Convenience helper to parse an OBJ string literal.
pub fn parse_obj_str(contents: &str) -> AssetResult<ParsedMeshData> {
    parse_obj(io::Cursor::new(contents), "<memory>")
}

fn read_error(source_name: &str, line: usize, err: io::Error) -> AssetError {
    AssetError::parse(source_name, line, format!("unreadable line: {}", err))
}

struct ObjParser<'a> {
    source_name: &'a str,
    data: ParsedMeshData,
}

impl<'a> ObjParser<'a> {
    fn new(source_name: &'a str) -> Self {
        Self {
            source_name,
            data: ParsedMeshData::default(),
        }
    }

    fn finish(self) -> ParsedMeshData {
        self.data
    }

    fn error(&self, line_no: usize, message: impl Into<String>) -> AssetError {
        AssetError::parse(self.source_name, line_no, message)
    }

    fn parse_line(&mut self, line_no: usize, line: &str) -> AssetResult<()> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(());
        }

        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            return Ok(());
        };

        match tag {
            "v" => {
                let [x, y, z] = self.parse_floats::<3>(parts, line_no, tag)?;
                self.data.positions.push(Vec3::new(x, y, z));
            }
            "vt" => {
                let [u, v] = self.parse_floats::<2>(parts, line_no, tag)?;
                self.data.texcoords.push(Vec2::new(u, v));
            }
            "vn" => {
                let [x, y, z] = self.parse_floats::<3>(parts, line_no, tag)?;
                self.data.normals.push(Vec3::new(x, y, z));
            }
            "f" => {
                let groups: Vec<&str> = parts.collect();
                if groups.len() > 3 {
                    return Err(self.error(
                        line_no,
                        format!(
                            "face with {} vertices: polygon triangulation not implemented",
                            groups.len()
                        ),
                    ));
                }
                if groups.len() < 3 {
                    return Err(self.error(
                        line_no,
                        format!("face needs 3 vertices, found {}", groups.len()),
                    ));
                }
                let mut corners = [None; 3];
                for (slot, group) in corners.iter_mut().zip(groups) {
                    *slot = Some(self.parse_corner(group, line_no)?);
                }
                self.data.corners.extend(corners.into_iter().flatten());
                self.data.face_lines.push(line_no);
            }
            "mtllib" => {
                let path = rest_of_line(trimmed, tag);
                if path.is_empty() {
                    return Err(self.error(line_no, "mtllib without a path"));
                }
                self.data.material_libraries.push(path.to_owned());
            }
            "usemtl" => {
                let name = rest_of_line(trimmed, tag);
                if self.data.material_name.is_none() && !name.is_empty() {
                    self.data.material_name = Some(name.to_owned());
                }
            }
            _ => {
                // o/g/s and friends carry nothing the vertex layout needs.
                log::trace!("{}:{}: ignoring '{}'", self.source_name, line_no, tag);
            }
        }

        Ok(())
    }

    /// Parses every remaining token and keeps the first `N` (an optional
    /// trailing `w` is accepted and dropped).
    fn parse_floats<const N: usize>(
        &self,
        tokens: SplitWhitespace<'_>,
        line_no: usize,
        tag: &str,
    ) -> AssetResult<[f32; N]> {
        let mut out = [0.0; N];
        let mut found = 0;
        for token in tokens {
            let value = token.parse::<f32>().map_err(|_| {
                self.error(line_no, format!("invalid number '{}' in '{}'", token, tag))
            })?;
            if found < N {
                out[found] = value;
            }
            found += 1;
        }
        if found < N {
            return Err(self.error(
                line_no,
                format!("'{}' needs {} components, found {}", tag, N, found),
            ));
        }
        Ok(out)
    }

    fn parse_corner(&self, group: &str, line_no: usize) -> AssetResult<FaceCorner> {
        if !group.contains('/') {
            let raw = self.parse_index(group, line_no)?;
            let position = self.absolute(raw, self.data.positions.len(), line_no)?;
            // A bare index stands for all three attributes.
            return Ok(FaceCorner {
                position,
                texcoord: relative_to(raw, self.data.texcoords.len()),
                normal: relative_to(raw, self.data.normals.len()),
            });
        }

        let mut split = group.split('/');
        let position = match split.next() {
            Some(token) if !token.is_empty() => {
                let raw = self.parse_index(token, line_no)?;
                self.absolute(raw, self.data.positions.len(), line_no)?
            }
            _ => {
                return Err(self.error(
                    line_no,
                    format!("face element '{}' has no position index", group),
                ));
            }
        };
        let texcoord = self.optional_index(split.next(), self.data.texcoords.len(), line_no)?;
        let normal = self.optional_index(split.next(), self.data.normals.len(), line_no)?;
        if split.next().is_some() {
            return Err(self.error(
                line_no,
                format!("face element '{}' has more than three fields", group),
            ));
        }

        Ok(FaceCorner {
            position,
            texcoord,
            normal,
        })
    }

    fn optional_index(
        &self,
        token: Option<&str>,
        len: usize,
        line_no: usize,
    ) -> AssetResult<Option<u32>> {
        match token {
            Some(token) if !token.is_empty() => {
                let raw = self.parse_index(token, line_no)?;
                self.absolute(raw, len, line_no).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn parse_index(&self, token: &str, line_no: usize) -> AssetResult<i64> {
        token
            .parse::<i64>()
            .map_err(|_| self.error(line_no, format!("invalid index '{}'", token)))
    }

    fn absolute(&self, raw: i64, len: usize, line_no: usize) -> AssetResult<u32> {
        if raw == 0 {
            return Err(self.error(line_no, "OBJ indices are 1-based; found 0"));
        }
        relative_to(raw, len).ok_or_else(|| {
            self.error(
                line_no,
                format!("index {} does not fit the {} elements read so far", raw, len),
            )
        })
    }
}

/// Turns a 1-based or negative (counted back from `len`) index into a
/// positive 1-based one. Positive indices are passed through unchecked.
fn relative_to(raw: i64, len: usize) -> Option<u32> {
    let absolute = if raw < 0 { len as i64 + raw + 1 } else { raw };
    if absolute < 1 {
        return None;
    }
    u32::try_from(absolute).ok()
}

fn rest_of_line<'l>(trimmed: &'l str, tag: &str) -> &'l str {
    trimmed[tag.len()..].trim()
}
