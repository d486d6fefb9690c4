use std::fmt;

pub mod tdcarp;

pub type VertexId = usize;

/// Time values of the planning horizon and the period boundaries.
pub type Time = i64;

/// Failure kinds of a single instance conversion. All of them abort the
/// conversion of the file they occur in; whether the run continues with the
/// next file is up to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertError {
    /// a header or record line does not match the expected shape
    Format { line: usize, reason: String },
    /// a vertex index out of bounds, or a self-loop
    Range {
        tail: VertexId,
        head: VertexId,
        vertex_count: usize,
    },
    /// the ordered pair (tail, head) occurs more than once
    DuplicateConnection { tail: VertexId, head: VertexId },
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::Format { line, reason } => {
                write!(f, "format error in line {}: {}", line, reason)
            }
            ConvertError::Range {
                tail,
                head,
                vertex_count,
            } => {
                write!(
                    f,
                    "connection {} -> {} outside vertex range 0..{}",
                    tail, head, vertex_count
                )
            }
            ConvertError::DuplicateConnection { tail, head } => {
                write!(f, "repeated connection {} -> {}", tail, head)
            }
        }
    }
}

impl std::error::Error for ConvertError {}
