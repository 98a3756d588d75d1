//! Matrix Market coordinate reader

use std::io::BufRead;

use crate::error::{MalformedInput, Result, TriangleError};
use crate::io::{parse_expected_triangles, LoadedGraph};
use crate::matrix::AdjacencyMatrix;

/// Upper bound on the entry reservation made from the size line
const MAX_RESERVED_ENTRIES: usize = 1 << 20;

/// Matrix Market format reader
pub struct MatrixMarketIO;

impl MatrixMarketIO {
    /// Read a square coordinate matrix as an undirected adjacency matrix
    ///
    /// Pattern, real and integer fields are accepted; entries with value zero
    /// and diagonal entries are dropped. General and symmetric storage both
    /// work since the pattern is symmetrized.
    pub fn read_adjacency<R: BufRead>(reader: R) -> Result<LoadedGraph> {
        let mut lines = reader.lines().enumerate();
        let mut expected_triangles = None;

        // Skip comments and read the size line: rows cols nnz
        let mut header = None;
        for (index, line) in lines.by_ref() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.starts_with('%') {
                if trimmed.starts_with("%%MatrixMarket") && !trimmed.contains("coordinate") {
                    return Err(TriangleError::Parse {
                        line: index + 1,
                        reason: "only coordinate Matrix Market files are supported".to_string(),
                    });
                }
                if let Some(count) = parse_expected_triangles(trimmed) {
                    expected_triangles = Some(count);
                }
                continue;
            }
            if !trimmed.is_empty() {
                header = Some((index + 1, trimmed.to_string()));
                break;
            }
        }

        let (header_line, header) = header.ok_or(MalformedInput::ZeroDimension)?;
        let parts: Vec<&str> = header.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(TriangleError::Parse {
                line: header_line,
                reason: "invalid Matrix Market size line".to_string(),
            });
        }

        let parse_count = |field: &str, what: &str| -> Result<usize> {
            field.parse().map_err(|_| TriangleError::Parse {
                line: header_line,
                reason: format!("invalid number of {}", what),
            })
        };
        let n_rows = parse_count(parts[0], "rows")?;
        let n_cols = parse_count(parts[1], "columns")?;
        let nnz = parse_count(parts[2], "non-zeros")?;

        if n_rows != n_cols {
            return Err(MalformedInput::NotSquare { n_rows, n_cols }.into());
        }

        // The header's nnz is untrusted, so it only bounds the initial reservation
        let mut edges: Vec<(usize, usize)> = Vec::with_capacity(nnz.min(MAX_RESERVED_ENTRIES));
        let mut entries = 0usize;
        let mut last_line = header_line;
        for (index, line) in lines {
            let line = line?;
            last_line = index + 1;
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.is_empty() || parts[0].starts_with('%') {
                continue;
            }

            let parse_error = |reason: &str| TriangleError::Parse {
                line: index + 1,
                reason: reason.to_string(),
            };
            entries += 1;
            if entries > nnz {
                return Err(parse_error("more entries than declared in the size line"));
            }
            if parts.len() < 2 {
                return Err(parse_error("expected row and column index"));
            }

            // Convert from 1-indexed to 0-indexed
            let row = parts[0]
                .parse::<usize>()
                .ok()
                .and_then(|r| r.checked_sub(1))
                .ok_or_else(|| parse_error("invalid row index"))?;
            let col = parts[1]
                .parse::<usize>()
                .ok()
                .and_then(|c| c.checked_sub(1))
                .ok_or_else(|| parse_error("invalid column index"))?;

            if let Some(value) = parts.get(2) {
                let value: f64 = value.parse().map_err(|_| parse_error("invalid value"))?;
                if value == 0.0 {
                    continue;
                }
            }

            edges.push((row, col));
        }

        if entries < nnz {
            return Err(TriangleError::Parse {
                line: last_line,
                reason: format!("size line declares {} entries, found {}", nnz, entries),
            });
        }

        // Zero-valued and diagonal entries may leave no edges at all
        let adjacency = if edges.is_empty() && n_rows > 0 {
            AdjacencyMatrix::zeros(n_rows, n_rows)
        } else {
            AdjacencyMatrix::from_edges(n_rows, &edges)?
        };

        Ok(LoadedGraph {
            adjacency,
            expected_triangles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_symmetric_pattern() {
        let input = "%%MatrixMarket matrix coordinate pattern symmetric\n\
                     % triangles: 1\n\
                     4 4 4\n\
                     2 1\n\
                     3 1\n\
                     3 2\n\
                     4 3\n";
        let graph = MatrixMarketIO::read_adjacency(input.as_bytes()).unwrap();

        assert_eq!(graph.adjacency.n_rows(), 4);
        assert_eq!(graph.adjacency.nnz(), 8);
        assert_eq!(graph.adjacency.row(2), &[0, 1, 3]);
        assert_eq!(graph.expected_triangles, Some(1));
    }

    #[test]
    fn test_read_real_general_drops_zeros_and_diagonal() {
        let input = "%%MatrixMarket matrix coordinate real general\n\
                     3 3 5\n\
                     1 1 4.0\n\
                     1 2 1.5\n\
                     2 1 1.5\n\
                     2 3 0.0\n\
                     3 2 2.0\n";
        let graph = MatrixMarketIO::read_adjacency(input.as_bytes()).unwrap();

        assert_eq!(graph.adjacency.row(0), &[1]);
        assert_eq!(graph.adjacency.row(1), &[0, 2]);
        assert_eq!(graph.adjacency.row(2), &[1]);
    }

    #[test]
    fn test_rejects_rectangular_and_array() {
        let err = MatrixMarketIO::read_adjacency("2 3 1\n1 2\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            TriangleError::MalformedInput(MalformedInput::NotSquare { n_rows: 2, n_cols: 3 })
        ));

        let err = MatrixMarketIO::read_adjacency(
            "%%MatrixMarket matrix array real general\n2 2\n1\n0\n0\n1\n".as_bytes(),
        )
        .unwrap_err();
        assert!(matches!(err, TriangleError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_out_of_range_index() {
        let err = MatrixMarketIO::read_adjacency("2 2 1\n1 3\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            TriangleError::MalformedInput(MalformedInput::VertexOutOfRange { u: 0, v: 2, n: 2 })
        ));
    }

    #[test]
    fn test_no_entries_is_edgeless_graph() {
        let graph = MatrixMarketIO::read_adjacency(
            "%%MatrixMarket matrix coordinate pattern symmetric\n5 5 0\n".as_bytes(),
        )
        .unwrap();
        assert_eq!(graph.adjacency.n_rows(), 5);
        assert_eq!(graph.adjacency.nnz(), 0);

        // Only diagonal and zero-valued entries
        let graph =
            MatrixMarketIO::read_adjacency("3 3 2\n2 2 1.0\n1 3 0\n".as_bytes()).unwrap();
        assert_eq!(graph.adjacency.n_rows(), 3);
        assert_eq!(graph.adjacency.nnz(), 0);
    }

    #[test]
    fn test_entry_count_must_match_size_line() {
        let err = MatrixMarketIO::read_adjacency("2 2 18446744073709551615\n1 2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, TriangleError::Parse { line: 2, .. }));

        let err = MatrixMarketIO::read_adjacency("3 3 1\n1 2\n2 3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, TriangleError::Parse { line: 3, .. }));
    }
}
