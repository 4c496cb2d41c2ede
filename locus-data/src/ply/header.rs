//! PLY header inspection.

use crate::error::DataError;
use std::io::BufRead;

/// One `element` declaration and the names of its properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlyElement {
    pub name: String,
    pub count: usize,
    pub properties: Vec<String>,
}

/// Parsed PLY header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlyHeader {
    /// `ascii`, `binary_little_endian` or `binary_big_endian`.
    pub format: String,
    pub comments: Vec<String>,
    pub elements: Vec<PlyElement>,
}

impl PlyHeader {
    /// Declared count of the named element, if it is declared.
    pub fn element_count(&self, name: &str) -> Option<usize> {
        self.elements
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.count)
    }
}

/// Read a PLY header, stopping at `end_header`.
pub fn read_header<R: BufRead>(reader: R) -> Result<PlyHeader, DataError> {
    let mut lines = reader.lines();
    let magic = lines.next().transpose()?;
    if magic.as_deref().map(str::trim) != Some("ply") {
        return Err(DataError::Ply("missing 'ply' magic line".to_string()));
    }

    let mut header = PlyHeader::default();
    for line in lines {
        let line = line?;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("end_header") => {
                if header.format.is_empty() {
                    return Err(DataError::Ply("missing format line".to_string()));
                }
                return Ok(header);
            }
            Some("format") => {
                header.format = tokens.next().unwrap_or_default().to_string();
            }
            Some("comment") | Some("obj_info") => {
                header.comments.push(tokens.collect::<Vec<_>>().join(" "));
            }
            Some("element") => {
                let (Some(name), Some(count)) = (tokens.next(), tokens.next()) else {
                    return Err(DataError::Ply(format!("malformed element line {:?}", line)));
                };
                let count = count
                    .parse()
                    .map_err(|_| DataError::Ply(format!("invalid element count {:?}", count)))?;
                header.elements.push(PlyElement {
                    name: name.to_string(),
                    count,
                    properties: Vec::new(),
                });
            }
            Some("property") => {
                let Some(element) = header.elements.last_mut() else {
                    return Err(DataError::Ply("property before any element".to_string()));
                };
                if let Some(name) = tokens.last() {
                    element.properties.push(name.to_string());
                }
            }
            Some(other) => {
                return Err(DataError::Ply(format!("unexpected header keyword {:?}", other)));
            }
            None => {}
        }
    }

    Err(DataError::Ply("missing end_header".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_header_elements() {
        let text = "\
ply
format ascii 1.0
comment hello world
element vertex 16
property float x
property float y
property float z
element face 24
property list uchar int vertex_indices
end_header
";
        let header = read_header(text.as_bytes()).unwrap();
        assert_eq!(header.format, "ascii");
        assert_eq!(header.comments, vec!["hello world"]);
        assert_eq!(header.element_count("vertex"), Some(16));
        assert_eq!(header.element_count("face"), Some(24));
        assert_eq!(header.element_count("edge"), None);
        assert_eq!(header.elements[1].properties, vec!["vertex_indices"]);
    }

    #[test]
    fn test_read_header_rejects_non_ply() {
        assert!(read_header("solid cube\n".as_bytes()).is_err());
        assert!(read_header("ply\nformat ascii 1.0\n".as_bytes()).is_err());
        assert!(read_header("ply\nelement vertex x\nend_header\n".as_bytes()).is_err());
    }
}
