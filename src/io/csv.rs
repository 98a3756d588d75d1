//! Edge-list and dense CSV readers

use std::io::BufRead;

use ndarray::Array2;

use crate::error::{MalformedInput, Result, TriangleError};
use crate::io::{parse_expected_triangles, LoadedGraph, ReadOptions};
use crate::matrix::AdjacencyMatrix;

/// Parsed contents of an edge-list file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeList {
    pub n_vertices: usize,
    /// Zero-based endpoint pairs in file order
    pub edges: Vec<(usize, usize)>,
    pub expected_triangles: Option<u64>,
}

impl EdgeList {
    /// Builds the CSR adjacency matrix
    ///
    /// A list with vertices but no edges yields the all-zero matrix.
    pub fn to_adjacency(&self) -> std::result::Result<AdjacencyMatrix, MalformedInput> {
        if self.edges.is_empty() && self.n_vertices > 0 {
            return Ok(AdjacencyMatrix::zeros(self.n_vertices, self.n_vertices));
        }
        AdjacencyMatrix::from_edges(self.n_vertices, &self.edges)
    }

    pub fn into_graph(self) -> Result<LoadedGraph> {
        Ok(LoadedGraph {
            adjacency: self.to_adjacency()?,
            expected_triangles: self.expected_triangles,
        })
    }
}

fn fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|field| !field.is_empty())
}

fn parse_error(line: usize, reason: impl Into<String>) -> TriangleError {
    TriangleError::Parse {
        line,
        reason: reason.into(),
    }
}

/// Reads an edge list
///
/// Lines are `u,v` or `u,v,w`; an edge with weight zero is skipped but its
/// endpoints still count as vertices. The vertex count is
/// `options.n_vertices` or the largest id + 1.
pub fn read_edge_list<R: BufRead>(reader: R, options: &ReadOptions) -> Result<EdgeList> {
    let mut edges = Vec::new();
    let mut expected_triangles = None;
    let mut min_vertices = 0usize;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if line.starts_with('#') || line.starts_with('%') {
            if let Some(count) = parse_expected_triangles(line) {
                expected_triangles = Some(count);
            }
            continue;
        }

        let parts: Vec<&str> = fields(line).collect();
        if parts.len() < 2 {
            return Err(parse_error(line_no, "expected at least two fields"));
        }

        let endpoint = |field: &str| -> Result<usize> {
            let id: usize = field
                .parse()
                .map_err(|_| parse_error(line_no, format!("invalid vertex id `{}`", field)))?;
            if options.one_based {
                id.checked_sub(1)
                    .ok_or_else(|| parse_error(line_no, "vertex id 0 in one-based input"))
            } else {
                Ok(id)
            }
        };
        let u = endpoint(parts[0])?;
        let v = endpoint(parts[1])?;
        let needed = u
            .max(v)
            .checked_add(1)
            .ok_or_else(|| parse_error(line_no, "vertex id too large"))?;
        min_vertices = min_vertices.max(needed);

        if let Some(weight) = parts.get(2) {
            let weight: f64 = weight
                .parse()
                .map_err(|_| parse_error(line_no, format!("invalid weight `{}`", weight)))?;
            if weight == 0.0 {
                continue;
            }
        }

        edges.push((u, v));
    }

    let n_vertices = options.n_vertices.unwrap_or(min_vertices);

    Ok(EdgeList {
        n_vertices,
        edges,
        expected_triangles,
    })
}

/// Reads a dense N×N adjacency matrix written as comma-separated rows
pub fn read_dense_csv<R: BufRead>(reader: R) -> Result<LoadedGraph> {
    let mut data: Vec<f32> = Vec::new();
    let mut n_cols: Option<usize> = None;
    let mut n_rows = 0;
    let mut expected_triangles = None;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if line.starts_with('#') || line.starts_with('%') {
            if let Some(count) = parse_expected_triangles(line) {
                expected_triangles = Some(count);
            }
            continue;
        }

        let row_start = data.len();
        for field in fields(line) {
            let value: f32 = field
                .parse()
                .map_err(|_| parse_error(line_no, format!("invalid matrix entry `{}`", field)))?;
            data.push(value);
        }

        let width = data.len() - row_start;
        match n_cols {
            None => n_cols = Some(width),
            Some(expected) if expected != width => {
                return Err(parse_error(
                    line_no,
                    format!("row has {} entries, expected {}", width, expected),
                ));
            }
            Some(_) => {}
        }
        n_rows += 1;
    }

    let n_cols = n_cols.unwrap_or(0);
    let dense = Array2::from_shape_vec((n_rows, n_cols), data)
        .map_err(|e| parse_error(n_rows, e.to_string()))?;

    if n_rows == 0 {
        return Err(MalformedInput::ZeroDimension.into());
    }

    Ok(LoadedGraph {
        adjacency: AdjacencyMatrix::from_dense(&dense)?,
        expected_triangles,
    })
}
