// Similarity asset loading: NumPy .npy (|u1, C order, shape (N, N, 3)) or a raw blob
use scapes_core::{Error, Result, SimilarityMatrix, RELATIONS};
use std::io::Write;
use std::path::Path;
use tracing::info;

const NPY_MAGIC: &[u8] = b"\x93NUMPY";

/// Load the similarity table, detecting the format from the file header
pub fn load_similarity<P: AsRef<Path>>(path: P) -> Result<SimilarityMatrix> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let matrix = if bytes.starts_with(NPY_MAGIC) {
        parse_npy(&bytes)?
    } else {
        parse_raw(bytes)?
    };
    info!("Loaded {0}x{0} similarity table from {1:?}", matrix.size(), path);
    Ok(matrix)
}

/// Raw C-ordered `N * N * 3` bytes; N is inferred from the length
pub fn parse_raw(bytes: Vec<u8>) -> Result<SimilarityMatrix> {
    let cells = bytes.len() / RELATIONS;
    let size = (cells as f64).sqrt().round() as usize;
    if size * size * RELATIONS != bytes.len() {
        return Err(Error::InvalidDimension {
            expected: size * size * RELATIONS,
            actual: bytes.len(),
        });
    }
    SimilarityMatrix::new(size, bytes)
}

pub fn parse_npy(bytes: &[u8]) -> Result<SimilarityMatrix> {
    if bytes.len() < 10 || !bytes.starts_with(NPY_MAGIC) {
        return Err(npy_error("missing magic string"));
    }
    let (header_len, header_start) = match bytes[6] {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err(npy_error("truncated header"));
            }
            (
                u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
                12,
            )
        }
        v => return Err(npy_error(&format!("unsupported version {}", v))),
    };
    let data_start = header_start + header_len;
    if bytes.len() < data_start {
        return Err(npy_error("truncated header"));
    }
    let header = std::str::from_utf8(&bytes[header_start..data_start])
        .map_err(|_| npy_error("header is not text"))?;

    let descr = header_value(header, "descr")
        .and_then(|v| v.strip_prefix('\''))
        .and_then(|v| v.split('\'').next())
        .ok_or_else(|| npy_error("missing descr"))?;
    if !matches!(descr, "|u1" | "u1" | "<u1" | ">u1") {
        return Err(npy_error(&format!("expected unsigned bytes, got '{}'", descr)));
    }

    let fortran = header_value(header, "fortran_order").ok_or_else(|| npy_error("missing fortran_order"))?;
    if !fortran.starts_with("False") {
        return Err(npy_error("fortran order is not supported"));
    }

    let shape = header_value(header, "shape")
        .and_then(|v| v.strip_prefix('('))
        .and_then(|v| v.split(')').next())
        .ok_or_else(|| npy_error("missing shape"))?;
    let dims = shape
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| d.parse::<usize>().map_err(|_| npy_error(&format!("bad dimension '{}'", d))))
        .collect::<Result<Vec<usize>>>()?;

    match dims.as_slice() {
        [a, b, c] if a == b && *c == RELATIONS => {
            SimilarityMatrix::new(*a, bytes[data_start..].to_vec())
        }
        _ => {
            let n = dims.first().copied().unwrap_or(0);
            Err(Error::InvalidDimension {
                expected: n * n * RELATIONS,
                actual: dims.iter().product(),
            })
        }
    }
}

/// Write `matrix` as a version 1 `.npy` file
pub fn write_npy<P: AsRef<Path>>(path: P, matrix: &SimilarityMatrix) -> Result<()> {
    let mut header = format!(
        "{{'descr': '|u1', 'fortran_order': False, 'shape': ({0}, {0}, {1}), }}",
        matrix.size(),
        RELATIONS
    );
    // Magic + version + length + header + newline is padded to 64 bytes.
    let unpadded = NPY_MAGIC.len() + 4 + header.len() + 1;
    header.push_str(&" ".repeat((64 - unpadded % 64) % 64));
    header.push('\n');

    let mut file = std::fs::File::create(path)?;
    file.write_all(NPY_MAGIC)?;
    file.write_all(&[1, 0])?;
    file.write_all(&(header.len() as u16).to_le_bytes())?;
    file.write_all(header.as_bytes())?;
    file.write_all(matrix.as_bytes())?;
    Ok(())
}

fn header_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("'{}':", key);
    let start = header.find(&needle)? + needle.len();
    Some(header[start..].trim_start())
}

fn npy_error(msg: &str) -> Error {
    Error::Serialization(format!("invalid npy file: {}", msg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scapes_core::Relation;

    fn sample() -> SimilarityMatrix {
        let data: Vec<u8> = (0..27).collect();
        SimilarityMatrix::new(3, data).unwrap()
    }

    #[test]
    fn test_raw_infers_size() {
        let m = parse_raw((0..27).collect()).unwrap();
        assert_eq!(m.size(), 3);
        assert_eq!(m.score(1, 2, Relation::Mixed), 4);
        assert!(matches!(
            parse_raw(vec![0; 26]),
            Err(Error::InvalidDimension { .. })
        ));
    }

    #[test]
    fn test_npy_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity.npy");
        write_npy(&path, &sample()).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        assert_eq!((10 + header_len) % 64, 0);

        assert_eq!(load_similarity(&path).unwrap(), sample());
    }

    #[test]
    fn test_npy_rejects_wrong_dtype() {
        let header = "{'descr': '<f4', 'fortran_order': False, 'shape': (1, 1, 3), }\n";
        let mut bytes = NPY_MAGIC.to_vec();
        bytes.extend_from_slice(&[1, 0]);
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(&[0; 12]);
        assert!(matches!(parse_npy(&bytes), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_npy_rejects_wrong_shape() {
        let header = "{'descr': '|u1', 'fortran_order': False, 'shape': (2, 3, 3), }\n";
        let mut bytes = NPY_MAGIC.to_vec();
        bytes.extend_from_slice(&[1, 0]);
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(&[0; 18]);
        assert!(matches!(
            parse_npy(&bytes),
            Err(Error::InvalidDimension { .. })
        ));
    }
}
