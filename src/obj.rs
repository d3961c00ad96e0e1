use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;
use thiserror::Error;

/// Indexed geometry parsed from an OBJ file.
///
/// Faces are already triangulated and their indices resolved to zero-based
/// offsets into `positions`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjData {
    pub positions: Vec<Vec3>,
    pub faces: Vec<[usize; 3]>,
}

impl ObjData {
    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }
}

#[derive(Debug, Error)]
pub enum ObjError {
    #[error("unable to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
    #[error("line {line}: vertex index {index} is out of range ({count} vertices defined)")]
    IndexOutOfRange {
        line: usize,
        index: i64,
        count: usize,
    },
    #[error("OBJ file does not define any vertices")]
    NoVertices,
    #[error("OBJ file does not define any faces")]
    NoFaces,
}

/// Reads and parses an OBJ file from disk.
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<ObjData, ObjError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ObjError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_obj(&contents)
}

/// Parses OBJ text held in memory.
///
/// Only positions and faces are kept; texture coordinates, normals, groups
/// and material statements are skipped. Polygons are split into triangle
/// fans around their first vertex.
pub fn parse_obj(data: &str) -> Result<ObjData, ObjError> {
    let mut positions = Vec::new();
    let mut polygons: Vec<(usize, Vec<i64>)> = Vec::new();

    for (line_no, line) in data.lines().enumerate() {
        let line_no = line_no + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        match tag {
            "v" => positions.push(parse_vec3(parts).map_err(|message| ObjError::Malformed {
                line: line_no,
                message: format!("invalid vertex: {message}"),
            })?),
            "f" => {
                let polygon = parse_face(parts).map_err(|message| ObjError::Malformed {
                    line: line_no,
                    message: format!("invalid face: {message}"),
                })?;
                polygons.push((line_no, polygon));
            }
            _ => {}
        }
    }

    if positions.is_empty() {
        return Err(ObjError::NoVertices);
    }
    if polygons.is_empty() {
        return Err(ObjError::NoFaces);
    }

    let mut faces = Vec::with_capacity(polygons.len());
    for (line, polygon) in &polygons {
        let resolved = polygon
            .iter()
            .map(|&index| {
                fix_index(index, positions.len()).ok_or(ObjError::IndexOutOfRange {
                    line: *line,
                    index,
                    count: positions.len(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        triangulate_face(&resolved, &mut faces);
    }

    Ok(ObjData { positions, faces })
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3, String> {
    let mut next = || -> Result<f32, String> {
        let component = parts
            .next()
            .ok_or_else(|| "missing vector component".to_string())?;
        component
            .parse::<f32>()
            .map_err(|err| format!("{component:?}: {err}"))
    };
    let x = next()?;
    let y = next()?;
    let z = next()?;
    Ok(Vec3::new(x, y, z))
}

fn parse_face<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Vec<i64>, String> {
    let mut indices = Vec::new();
    for part in parts {
        let vertex = part
            .split('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| format!("{part:?} has no vertex index"))?;
        let index = vertex
            .parse::<i64>()
            .map_err(|err| format!("{vertex:?}: {err}"))?;
        indices.push(index);
    }
    if indices.len() < 3 {
        return Err("faces must reference at least 3 vertices".into());
    }
    Ok(indices)
}

fn triangulate_face(polygon: &[usize], faces: &mut Vec<[usize; 3]>) {
    if polygon.len() < 3 {
        return;
    }
    for i in 1..(polygon.len() - 1) {
        faces.push([polygon[0], polygon[i], polygon[i + 1]]);
    }
}

/// Converts a one-based (or negative, relative) OBJ index to a zero-based one.
fn fix_index(index: i64, len: usize) -> Option<usize> {
    if index > 0 {
        let zero_based = usize::try_from(index - 1).ok()?;
        (zero_based < len).then_some(zero_based)
    } else if index < 0 {
        let back = usize::try_from(index.unsigned_abs()).ok()?;
        (back <= len).then(|| len - back)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_triangle() {
        let obj = "\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let data = parse_obj(obj).unwrap();
        assert_eq!(data.positions.len(), 3);
        assert_eq!(data.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn quads_are_split_into_fans() {
        let obj = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1/1/1 2/2/1 3/3/1 4/4/1\n";
        let data = parse_obj(obj).unwrap();
        assert_eq!(data.faces, vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(data.triangle_count(), 2);
    }

    #[test]
    fn negative_indices_count_from_the_end() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3//1 -2//1 -1//1\n";
        let data = parse_obj(obj).unwrap();
        assert_eq!(data.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn ignores_comments_and_unknown_statements() {
        let obj = "# bunny\no Bunny\nvn 0 0 1\nvt 0 0\nv 0 0 0\nv 1 0 0\nv 0 1 0\ns off\nf 1 2 3\n";
        let data = parse_obj(obj).unwrap();
        assert_eq!(data.triangle_count(), 1);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n";
        let err = parse_obj(obj).unwrap_err();
        assert!(matches!(
            err,
            ObjError::IndexOutOfRange {
                line: 4,
                index: 4,
                count: 3
            }
        ));
    }

    #[test]
    fn malformed_vertex_reports_line() {
        let obj = "v 0 0 0\nv 1 zero 0\n";
        let err = parse_obj(obj).unwrap_err();
        assert!(matches!(err, ObjError::Malformed { line: 2, .. }));
        assert!(err.to_string().starts_with("line 2: invalid vertex"));
    }

    #[test]
    fn degenerate_face_is_an_error() {
        let obj = "v 0 0 0\nv 1 0 0\nf 1 2\n";
        assert!(matches!(
            parse_obj(obj).unwrap_err(),
            ObjError::Malformed { line: 3, .. }
        ));
    }

    #[test]
    fn empty_inputs_are_rejected() {
        assert!(matches!(parse_obj("").unwrap_err(), ObjError::NoVertices));
        assert!(matches!(
            parse_obj("v 0 0 0\nv 1 0 0\n").unwrap_err(),
            ObjError::NoFaces
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_obj("does/not/exist.obj").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.obj"));
    }
}
