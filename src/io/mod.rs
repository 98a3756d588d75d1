//! Graph loaders
//!
//! Three text formats are understood:
//!
//! * **Edge list** (`.csv`, `.txt`, ...): one `u,v` pair per line, an optional
//!   third weight column (zero weight means no edge). Commas, semicolons and
//!   whitespace all separate fields.
//! * **Dense CSV**: an N×N matrix of numbers, nonzero off-diagonal entries
//!   are edges.
//! * **Matrix Market** (`.mtx`): coordinate format, 1-based.
//!
//! Lines starting with `#` or `%` are comments. A comment of the form
//! `# triangles: K` declares the expected triangle count of the graph.

pub mod csv;
pub mod matrix_market;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::matrix::AdjacencyMatrix;

pub use csv::{read_dense_csv, read_edge_list, EdgeList};
pub use matrix_market::MatrixMarketIO;

/// On-disk format of a graph file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    /// Matrix Market for `.mtx`, edge list otherwise
    #[default]
    Auto,
    EdgeList,
    Dense,
    MatrixMarket,
}

impl InputFormat {
    /// Resolves [`InputFormat::Auto`] from the file extension
    pub fn resolve(self, path: &Path) -> InputFormat {
        match self {
            InputFormat::Auto => match path.extension().and_then(|e| e.to_str()) {
                Some(ext) if ext.eq_ignore_ascii_case("mtx") => InputFormat::MatrixMarket,
                _ => InputFormat::EdgeList,
            },
            other => other,
        }
    }
}

/// Options for edge-list parsing
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Vertex ids start at 1
    pub one_based: bool,
    /// Number of vertices; defaults to the largest id + 1
    pub n_vertices: Option<usize>,
}

/// A loaded adjacency matrix and the triangle count its file declares, if any
#[derive(Debug, Clone)]
pub struct LoadedGraph {
    pub adjacency: AdjacencyMatrix,
    pub expected_triangles: Option<u64>,
}

/// Reads a graph file into a CSR adjacency matrix
pub fn load_graph(path: &Path, format: InputFormat, options: &ReadOptions) -> Result<LoadedGraph> {
    let format = format.resolve(path);
    let reader = BufReader::new(File::open(path)?);

    let graph = match format {
        InputFormat::MatrixMarket => MatrixMarketIO::read_adjacency(reader)?,
        InputFormat::Dense => read_dense_csv(reader)?,
        InputFormat::EdgeList | InputFormat::Auto => read_edge_list(reader, options)?.into_graph()?,
    };

    info!(
        path = %path.display(),
        ?format,
        vertices = graph.adjacency.n_rows(),
        edges = graph.adjacency.nnz() / 2,
        "loaded graph"
    );
    Ok(graph)
}

/// Parses `triangles: K` out of a comment line
pub(crate) fn parse_expected_triangles(comment: &str) -> Option<u64> {
    let body = comment.trim_start_matches(|c: char| c == '#' || c == '%').trim();
    let (key, value) = body.split_once(':')?;
    if key.trim().eq_ignore_ascii_case("triangles") {
        value.trim().parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_format() {
        assert_eq!(InputFormat::Auto.resolve(Path::new("g.mtx")), InputFormat::MatrixMarket);
        assert_eq!(InputFormat::Auto.resolve(Path::new("g.MTX")), InputFormat::MatrixMarket);
        assert_eq!(InputFormat::Auto.resolve(Path::new("g.csv")), InputFormat::EdgeList);
        assert_eq!(InputFormat::Dense.resolve(Path::new("g.mtx")), InputFormat::Dense);
    }

    #[test]
    fn test_parse_expected_triangles() {
        assert_eq!(parse_expected_triangles("# triangles: 12"), Some(12));
        assert_eq!(parse_expected_triangles("%% Triangles:3"), Some(3));
        assert_eq!(parse_expected_triangles("# vertices: 3"), None);
        assert_eq!(parse_expected_triangles("# just a comment"), None);
    }

    #[test]
    fn test_load_graph_from_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "# triangles: 1").unwrap();
        writeln!(file, "0,1\n1,2\n2,0\n2,3").unwrap();

        let graph = load_graph(file.path(), InputFormat::Auto, &ReadOptions::default()).unwrap();
        assert_eq!(graph.adjacency.n_rows(), 4);
        assert_eq!(graph.adjacency.nnz(), 8);
        assert_eq!(graph.expected_triangles, Some(1));
    }
}
